use super::period::PeriodKey;

/// Decision for the single rollover state variable (`last_closed_period`)
/// at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloverAction {
    /// Already on the current period.
    NoOp,
    /// No marker yet; adopt the current period without archiving.
    FirstRun,
    /// The marker names an older period: archive the live store under it
    /// (when non-empty), clear the live store, then adopt `now`.
    Close { stale: PeriodKey },
}

/// Pure state-machine step. If the user was inactive across several period
/// boundaries, only the single most-recently-open period is closed; no
/// synthetic empty archives are produced for the skipped months.
pub fn plan(last_closed: Option<&PeriodKey>, now: &PeriodKey) -> RolloverAction {
    match last_closed {
        None => RolloverAction::FirstRun,
        Some(previous) if previous == now => RolloverAction::NoOp,
        Some(previous) => RolloverAction::Close {
            stale: previous.clone(),
        },
    }
}

/// Where a newly entered transaction belongs relative to the open period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRoute {
    /// Current (or future-dated) entry: append to the live store.
    Live,
    /// Dated strictly before the open period: merge into that period's
    /// archive record, leaving the live store untouched.
    Archive(PeriodKey),
}

pub fn route_entry(entry_period: &PeriodKey, now: &PeriodKey) -> EntryRoute {
    if entry_period < now {
        EntryRoute::Archive(entry_period.clone())
    } else {
        EntryRoute::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> PeriodKey {
        PeriodKey::parse(raw).unwrap()
    }

    #[test]
    fn same_period_is_noop() {
        assert_eq!(plan(Some(&key("2024-06")), &key("2024-06")), RolloverAction::NoOp);
    }

    #[test]
    fn missing_marker_is_first_run() {
        assert_eq!(plan(None, &key("2024-06")), RolloverAction::FirstRun);
    }

    #[test]
    fn stale_marker_closes_that_period() {
        assert_eq!(
            plan(Some(&key("2024-05")), &key("2024-06")),
            RolloverAction::Close { stale: key("2024-05") }
        );
    }

    #[test]
    fn multi_month_gap_still_closes_only_the_stale_period() {
        assert_eq!(
            plan(Some(&key("2024-01")), &key("2024-06")),
            RolloverAction::Close { stale: key("2024-01") }
        );
    }

    #[test]
    fn routing_splits_on_strictly_earlier_periods() {
        let now = key("2024-06");
        assert_eq!(route_entry(&key("2024-06"), &now), EntryRoute::Live);
        assert_eq!(route_entry(&key("2024-07"), &now), EntryRoute::Live);
        assert_eq!(
            route_entry(&key("2024-04"), &now),
            EntryRoute::Archive(key("2024-04"))
        );
    }
}
