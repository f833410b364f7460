use std::{
    env, fs,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use dirs::home_dir;

use super::{KeyValueStore, Result};

const DEFAULT_DIR_NAME: &str = ".budgetflow";
const USERS_DIR: &str = "users";
const TMP_SUFFIX: &str = "tmp";

/// Returns the application data directory, defaulting to `~/.budgetflow`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("BUDGETFLOW_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// File-backed key/value store, one JSON file per logical key, scoped to a
/// single user. Writes go through a temp file and rename so a failed write
/// never corrupts the previous blob.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(root: Option<PathBuf>, user: &str) -> Result<Self> {
        let base = root.unwrap_or_else(app_data_dir);
        let dir = base.join(USERS_DIR).join(canonical_user(user));
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn for_user(user: &str) -> Result<Self> {
        Self::new(None, user)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_path(key);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn canonical_user(user: &str) -> String {
    let sanitized: String = user
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "default".into()
    } else {
        sanitized
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}
