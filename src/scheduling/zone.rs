//! Wall-clock to UTC conversion for picked appointment times.
//!
//! The offset is looked up for the appointment's own date, so a booking on
//! the other side of a DST change converts with that season's offset.

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::SchedulingError;

/// The zone appointment times are picked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClinicTimeZone {
    /// The host's zone, DST rules included.
    #[default]
    Local,
    /// An IANA zone such as `Europe/Madrid`.
    Named(Tz),
    /// A constant offset with no DST.
    Fixed(FixedOffset),
}

impl ClinicTimeZone {
    /// Resolve a wall-clock time to a UTC instant.
    ///
    /// A time skipped by a DST gap is `NonexistentLocalTime`. A time that
    /// occurs twice resolves to the earlier instant.
    pub fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, SchedulingError> {
        match self {
            Self::Local => resolve(&Local, local),
            Self::Named(tz) => resolve(tz, local),
            Self::Fixed(offset) => resolve(offset, local),
        }
    }
}

impl std::fmt::Display for ClinicTimeZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

fn resolve<Z: TimeZone>(zone: &Z, local: NaiveDateTime) -> Result<DateTime<Utc>, SchedulingError> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => {
            debug!(%local, "Ambiguous local time, using the earlier instant");
            Ok(earliest.with_timezone(&Utc))
        }
        LocalResult::None => Err(SchedulingError::NonexistentLocalTime { local }),
    }
}
