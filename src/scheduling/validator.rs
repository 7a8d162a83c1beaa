//! Appointment validation and submission.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::hours::WorkingHours;
use super::picker::{PendingSelection, PickerEvent, PickerPhase};
use super::zone::ClinicTimeZone;
use crate::api::{Appointment, VetApi, Veterinarian};
use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, SchedulingError};
use crate::operation::{self, CancellationToken, Interrupted};

/// An appointment time that passed the working-hours check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentRequest {
    veterinarian_id: String,
    when_utc: DateTime<Utc>,
}

impl AppointmentRequest {
    pub(crate) fn new(veterinarian_id: impl Into<String>, when_utc: DateTime<Utc>) -> Self {
        Self {
            veterinarian_id: veterinarian_id.into(),
            when_utc,
        }
    }

    /// Validate a selection against working hours and build the request.
    ///
    /// `zone` is the zone the selection was picked in; its offset is taken
    /// for the selected date. No date-in-the-past check happens here; the
    /// picker forbids past dates.
    pub fn from_selection(
        selection: &PendingSelection,
        hours: &WorkingHours,
        veterinarian_id: &str,
        zone: ClinicTimeZone,
    ) -> Result<Self, SchedulingError> {
        let local = selection
            .resolved()
            .ok_or(SchedulingError::SelectionIncomplete)?;

        let window = hours.window().inspect_err(|e| {
            tracing::error!(veterinarian_id, "Unusable working hours: {}", e);
        })?;

        if !window.contains(local.time()) {
            return Err(SchedulingError::OutsideWorkingHours {
                selected: local.time(),
                start: window.start(),
                end: window.end(),
            });
        }

        let when_utc = zone.to_utc(local)?;
        Ok(Self::new(veterinarian_id, when_utc))
    }

    pub fn veterinarian_id(&self) -> &str {
        &self.veterinarian_id
    }

    pub fn when_utc(&self) -> DateTime<Utc> {
        self.when_utc
    }
}

/// Drives one appointment-request interaction: picker input, then a
/// validated submission.
pub struct SchedulingValidator {
    api: Arc<dyn VetApi>,
    credentials: Arc<dyn CredentialStore>,
    zone: ClinicTimeZone,
    timeout: Duration,
    selection: PendingSelection,
}

impl SchedulingValidator {
    pub fn new(
        api: Arc<dyn VetApi>,
        credentials: Arc<dyn CredentialStore>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            credentials,
            zone: config.time_zone,
            timeout: config.request_timeout,
            selection: PendingSelection::default(),
        }
    }

    pub fn selection(&self) -> &PendingSelection {
        &self.selection
    }

    pub fn open_picker(&mut self) -> Result<PickerPhase, SchedulingError> {
        self.apply(PickerEvent::Open)
    }

    /// Merge the chosen date; the picker moves straight on to time.
    pub fn choose_date(&mut self, date: chrono::NaiveDate) -> Result<PickerPhase, SchedulingError> {
        self.apply(PickerEvent::DateChosen(date))
    }

    pub fn choose_time(&mut self, time: chrono::NaiveTime) -> Result<PickerPhase, SchedulingError> {
        self.apply(PickerEvent::TimeChosen(time))
    }

    /// Re-open in time mode after a working-hours rejection.
    pub fn repick_time(&mut self) -> Result<PickerPhase, SchedulingError> {
        self.apply(PickerEvent::RepickTime)
    }

    /// Picker dismissed: nothing of the selection survives.
    pub fn cancel_picker(&mut self) {
        self.selection = PendingSelection::default();
    }

    fn apply(&mut self, event: PickerEvent) -> Result<PickerPhase, SchedulingError> {
        let next = self.selection.apply(event)?;
        debug!(from = %self.selection.phase(), to = %next.phase(), "Picker transition");
        self.selection = next;
        Ok(next.phase())
    }

    /// Check the selection against `hours` and request the appointment.
    ///
    /// Nothing reaches the network unless the selection is complete, inside
    /// working hours, and a credential exists. The selection is cleared only
    /// on success; every failure leaves it as it was.
    pub async fn validate_and_submit(
        &mut self,
        hours: &WorkingHours,
        veterinarian_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Appointment, SchedulingError> {
        let request =
            AppointmentRequest::from_selection(&self.selection, hours, veterinarian_id, self.zone)
                .inspect_err(|e| debug!(veterinarian_id, "Appointment not submitted: {}", e))?;

        let credential = self
            .credentials
            .get()
            .await?
            .ok_or(SchedulingError::Unauthorized)?;

        let result = operation::guard(
            cancel,
            self.timeout,
            self.api.create_appointment(credential.token(), &request),
        )
        .await;

        let appointment = match result {
            Ok(Ok(appointment)) => appointment,
            Ok(Err(e)) => {
                warn!(veterinarian_id, "Appointment submission failed: {}", e);
                return Err(SchedulingError::SubmissionFailed(e));
            }
            Err(Interrupted::TimedOut(after)) => {
                warn!(veterinarian_id, "Appointment submission timed out");
                return Err(SchedulingError::SubmissionFailed(ApiError::Timeout(after)));
            }
            Err(Interrupted::Cancelled) => return Err(SchedulingError::Cancelled),
        };

        info!(
            appointment_id = %appointment.id,
            veterinarian_id,
            when = %request.when_utc(),
            "Appointment requested"
        );
        self.selection = PendingSelection::default();
        Ok(appointment)
    }

    /// Same as `validate_and_submit`, taking the hours from the veterinarian.
    pub async fn book(
        &mut self,
        veterinarian: &Veterinarian,
        cancel: &CancellationToken,
    ) -> Result<Appointment, SchedulingError> {
        let hours = WorkingHours::from_veterinarian(veterinarian)?;
        self.validate_and_submit(&hours, &veterinarian.id, cancel)
            .await
    }
}
