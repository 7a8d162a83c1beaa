//! Two-phase date/time picker state machine.
//!
//! The picker always asks for a date first and then immediately for a
//! time. Transitions are pure: `apply` returns the next selection and
//! leaves `self` untouched, so a rejected event never corrupts state.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::SchedulingError;

/// Which input the picker is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerPhase {
    #[default]
    AwaitingDate,
    AwaitingTime,
    /// Date and time both chosen.
    Ready,
}

impl PickerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingDate => "awaiting_date",
            Self::AwaitingTime => "awaiting_time",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for PickerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A picker interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    /// Open (or re-open) the picker in date mode.
    Open,
    DateChosen(NaiveDate),
    TimeChosen(NaiveTime),
    /// Re-open directly in time mode, keeping the chosen date.
    RepickTime,
    /// Picker dismissed without a value.
    Cancel,
}

impl PickerEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::DateChosen(_) => "date",
            Self::TimeChosen(_) => "time",
            Self::RepickTime => "repick_time",
            Self::Cancel => "cancel",
        }
    }
}

/// The in-progress, not yet submitted appointment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingSelection {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    phase: PickerPhase,
}

impl PendingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PickerPhase {
        self.phase
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    /// No date and no time selected.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The fully resolved wall-clock timestamp, once both phases completed.
    pub fn resolved(&self) -> Option<NaiveDateTime> {
        match (self.phase, self.date, self.time) {
            (PickerPhase::Ready, Some(date), Some(time)) => Some(date.and_time(time)),
            _ => None,
        }
    }

    /// Value the picker should show: whatever is chosen so far, the rest from `now`.
    pub fn picker_value(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.date
            .unwrap_or(now.date())
            .and_time(self.time.unwrap_or(now.time()))
    }

    /// Compute the selection that results from `event`.
    pub fn apply(&self, event: PickerEvent) -> Result<Self, SchedulingError> {
        use PickerPhase::*;

        let next = match (self.phase, event) {
            (_, PickerEvent::Cancel) => Self::default(),
            (_, PickerEvent::Open) => Self {
                phase: AwaitingDate,
                ..*self
            },
            (AwaitingDate, PickerEvent::DateChosen(date)) => Self {
                date: Some(date),
                phase: AwaitingTime,
                ..*self
            },
            (AwaitingTime, PickerEvent::TimeChosen(time)) => Self {
                time: Some(truncate_to_minute(time)),
                phase: Ready,
                ..*self
            },
            (Ready, PickerEvent::RepickTime) => Self {
                phase: AwaitingTime,
                ..*self
            },
            (phase, event) => {
                return Err(SchedulingError::UnexpectedPickerEvent {
                    phase: phase.as_str(),
                    event: event.name(),
                });
            }
        };
        Ok(next)
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ready(d: NaiveDate, t: NaiveTime) -> PendingSelection {
        PendingSelection::new()
            .apply(PickerEvent::DateChosen(d))
            .unwrap()
            .apply(PickerEvent::TimeChosen(t))
            .unwrap()
    }

    #[test]
    fn date_then_time_resolves() {
        let s = PendingSelection::new();
        assert_eq!(s.phase(), PickerPhase::AwaitingDate);

        let s = s.apply(PickerEvent::DateChosen(date(2025, 6, 10))).unwrap();
        assert_eq!(s.phase(), PickerPhase::AwaitingTime);
        assert!(s.resolved().is_none());

        let s = s.apply(PickerEvent::TimeChosen(time(14, 30))).unwrap();
        assert_eq!(s.phase(), PickerPhase::Ready);
        assert_eq!(s.resolved(), Some(date(2025, 6, 10).and_time(time(14, 30))));
    }

    #[test]
    fn time_phase_only_alters_hour_and_minute() {
        let d = date(2025, 12, 31);
        for (h, m) in [(0, 0), (9, 15), (23, 59)] {
            let resolved = ready(d, time(h, m)).resolved().unwrap();
            assert_eq!(resolved.date(), d);
            assert_eq!(resolved.time(), time(h, m));
        }
    }

    #[test]
    fn seconds_from_the_picker_are_dropped() {
        let s = ready(date(2025, 6, 10), NaiveTime::from_hms_milli_opt(14, 30, 42, 500).unwrap());
        assert_eq!(s.time(), Some(time(14, 30)));
    }

    #[test]
    fn cancel_always_empties_the_selection() {
        let candidates = [
            PendingSelection::new(),
            PendingSelection::new()
                .apply(PickerEvent::DateChosen(date(2025, 6, 10)))
                .unwrap(),
            ready(date(2025, 6, 10), time(10, 0)),
            ready(date(2025, 6, 10), time(10, 0))
                .apply(PickerEvent::RepickTime)
                .unwrap(),
        ];
        for s in candidates {
            let cancelled = s.apply(PickerEvent::Cancel).unwrap();
            assert!(cancelled.is_empty(), "cancel from {:?} left {:?}", s.phase(), cancelled);
            assert_eq!(cancelled.phase(), PickerPhase::AwaitingDate);
            assert_eq!(cancelled.apply(PickerEvent::Cancel).unwrap(), cancelled);
        }
    }

    #[test]
    fn out_of_order_events_are_rejected_without_change() {
        let s = PendingSelection::new();
        assert!(s.apply(PickerEvent::TimeChosen(time(9, 0))).is_err());
        assert!(s.apply(PickerEvent::RepickTime).is_err());

        let awaiting_time = s.apply(PickerEvent::DateChosen(date(2025, 6, 10))).unwrap();
        let err = awaiting_time
            .apply(PickerEvent::DateChosen(date(2025, 6, 11)))
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::UnexpectedPickerEvent {
                phase: "awaiting_time",
                event: "date"
            }
        ));
        assert_eq!(awaiting_time.date(), Some(date(2025, 6, 10)));
    }

    #[test]
    fn repick_time_keeps_date() {
        let s = ready(date(2025, 6, 10), time(17, 1))
            .apply(PickerEvent::RepickTime)
            .unwrap();
        assert_eq!(s.phase(), PickerPhase::AwaitingTime);
        assert_eq!(s.date(), Some(date(2025, 6, 10)));

        let s = s.apply(PickerEvent::TimeChosen(time(16, 45))).unwrap();
        assert_eq!(s.resolved(), Some(date(2025, 6, 10).and_time(time(16, 45))));
    }

    #[test]
    fn reopening_seeds_picker_with_previous_choice() {
        let now = date(2025, 1, 1).and_time(time(8, 0));
        assert_eq!(PendingSelection::new().picker_value(now), now);

        let reopened = ready(date(2025, 6, 10), time(14, 30))
            .apply(PickerEvent::Open)
            .unwrap();
        assert_eq!(reopened.phase(), PickerPhase::AwaitingDate);
        assert!(reopened.resolved().is_none());
        assert_eq!(
            reopened.picker_value(now),
            date(2025, 6, 10).and_time(time(14, 30))
        );

        // Date chosen, time still pending: time comes from the wall clock
        let half = PendingSelection::new()
            .apply(PickerEvent::DateChosen(date(2025, 6, 10)))
            .unwrap();
        assert_eq!(half.picker_value(now), date(2025, 6, 10).and_time(time(8, 0)));
    }
}
