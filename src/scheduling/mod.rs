//! Appointment scheduling — date/time capture and working-hours validation.
//!
//! A booking is captured in two picker phases (date, then time), merged
//! into one wall-clock timestamp, and checked against the veterinarian's
//! inclusive working-hours window before anything is sent to the server.

pub mod hours;
pub mod picker;
pub mod validator;
pub mod zone;

pub use hours::{HoursWindow, WorkingHours};
pub use picker::{PendingSelection, PickerEvent, PickerPhase};
pub use validator::{AppointmentRequest, SchedulingValidator};
pub use zone::ClinicTimeZone;
