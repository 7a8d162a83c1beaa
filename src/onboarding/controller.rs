//! OnboardingController — gates each onboarding screen on the credential and
//! the current step, and only advances after the server accepted the step.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::forms::{LoginForm, PetForm, ProfileForm, RegistrationForm};
use super::state::{OnboardingState, OnboardingStep};
use crate::api::{AuthSession, ImageUpload, Pet, VetApi};
use crate::config::ClientConfig;
use crate::credentials::{Credential, CredentialStore};
use crate::error::{ApiError, OnboardingError, SubmissionError, ValidationError};
use crate::operation::{self, CancellationToken, Interrupted};

/// Coordinates the onboarding flow: form validation, credential checks,
/// server calls, and step transitions.
pub struct OnboardingController {
    api: Arc<dyn VetApi>,
    credentials: Arc<dyn CredentialStore>,
    timeout: Duration,
    state: RwLock<OnboardingState>,
}

impl OnboardingController {
    pub fn new(
        api: Arc<dyn VetApi>,
        credentials: Arc<dyn CredentialStore>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            credentials,
            timeout: config.request_timeout,
            state: RwLock::new(OnboardingState::default()),
        }
    }

    /// Snapshot of the current state.
    pub async fn current_state(&self) -> OnboardingState {
        self.state.read().await.clone()
    }

    pub async fn current_step(&self) -> OnboardingStep {
        self.state.read().await.step()
    }

    /// Create an account and sign in with it.
    pub async fn register(
        &self,
        form: &RegistrationForm,
        cancel: &CancellationToken,
    ) -> Result<OnboardingStep, OnboardingError> {
        validated(form.validate(), "register")?;
        self.require_step(OnboardingStep::Anonymous, "register").await?;

        let session = self
            .call(
                cancel,
                self.api
                    .register(&form.username, form.email.trim(), &form.password),
            )
            .await?;
        self.establish_session(session, "register").await
    }

    /// Sign in with an existing account.
    ///
    /// Lands in the profile step; `resolve_current_state` tells whether the
    /// account already got further.
    pub async fn login(
        &self,
        form: &LoginForm,
        cancel: &CancellationToken,
    ) -> Result<OnboardingStep, OnboardingError> {
        validated(form.validate(), "login")?;
        self.require_step(OnboardingStep::Anonymous, "login").await?;

        let session = self
            .call(
                cancel,
                self.api.authenticate(form.email.trim(), &form.password),
            )
            .await?;
        self.establish_session(session, "login").await
    }

    pub async fn update_profile(
        &self,
        form: &ProfileForm,
        cancel: &CancellationToken,
    ) -> Result<OnboardingStep, OnboardingError> {
        let update = validated(form.validate(), "update_profile")?;
        let credential = self.credential().await?;
        self.require_step(OnboardingStep::AuthenticatedIncompleteProfile, "update profile")
            .await?;

        self.call(cancel, self.api.update_profile(credential.token(), &update))
            .await?;
        self.advance(
            OnboardingStep::AuthenticatedIncompleteProfile,
            OnboardingStep::ProfileCompleteNoPets,
            None,
        )
        .await
    }

    /// Register the first pet. Its id is kept for the image step.
    pub async fn create_pet(
        &self,
        form: &PetForm,
        cancel: &CancellationToken,
    ) -> Result<Pet, OnboardingError> {
        let new_pet = validated(form.validate(), "create_pet")?;
        let credential = self.credential().await?;
        self.require_step(OnboardingStep::ProfileCompleteNoPets, "create pet")
            .await?;

        let pet = self
            .call(cancel, self.api.create_pet(credential.token(), &new_pet))
            .await?;
        self.advance(
            OnboardingStep::ProfileCompleteNoPets,
            OnboardingStep::HasPetNoImage,
            Some(pet.id.clone()),
        )
        .await?;
        Ok(pet)
    }

    /// Upload the photo of the pet created in the previous step.
    pub async fn upload_pet_image(
        &self,
        image: &ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<OnboardingStep, OnboardingError> {
        if image.bytes.is_empty() {
            return Err(ValidationError::MissingField { field: "image" }.into());
        }
        let credential = self.credential().await?;
        let state = self
            .require_step(OnboardingStep::HasPetNoImage, "upload pet image")
            .await?;
        let pet_id = state
            .pet_id()
            .map(str::to_string)
            .ok_or_else(|| state.invalid("upload pet image"))?;

        self.call(
            cancel,
            self.api
                .upload_pet_image(credential.token(), &pet_id, image),
        )
        .await?;
        let step = self
            .advance(OnboardingStep::HasPetNoImage, OnboardingStep::Onboarded, None)
            .await?;
        info!(pet_id = %pet_id, "Onboarding complete");
        Ok(step)
    }

    /// Return to the previous screen of the session.
    pub async fn go_back(&self) -> Result<OnboardingStep, OnboardingError> {
        let mut state = self.state.write().await;
        let from = state.step();
        let to = state.go_back()?;
        debug!(from = %from, to = %to, "Onboarding went back");
        Ok(to)
    }

    /// Drop the credential and start over.
    pub async fn logout(&self) -> Result<(), OnboardingError> {
        let mut state = self.state.write().await;
        self.credentials
            .clear()
            .await
            .map_err(SubmissionError::from)?;
        *state = OnboardingState::default();
        info!("Logged out");
        Ok(())
    }

    /// Work out where a returning user belongs.
    ///
    /// Without a stored credential this is `Anonymous` and no request is
    /// made. Otherwise the profile is fetched first and the pets only once
    /// the profile is complete. A pet with a photo means onboarding is done.
    pub async fn resolve_current_state(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OnboardingState, OnboardingError> {
        let Some(credential) = self.stored_credential().await? else {
            return Ok(self.replace_state(OnboardingState::default()).await);
        };

        let profile = self
            .call(cancel, self.api.get_profile(credential.token()))
            .await?;
        if !profile.is_complete() {
            return Ok(self
                .replace_state(OnboardingState::at(
                    OnboardingStep::AuthenticatedIncompleteProfile,
                ))
                .await);
        }

        let pets = self
            .call(cancel, self.api.get_pets_by_client(credential.user_id()))
            .await?;
        let resolved = if pets.iter().any(Pet::has_image) {
            OnboardingState::at(OnboardingStep::Onboarded)
        } else if let Some(first) = pets.first() {
            OnboardingState::with_pet(first.id.clone())
        } else {
            OnboardingState::at(OnboardingStep::ProfileCompleteNoPets)
        };
        Ok(self.replace_state(resolved).await)
    }

    async fn replace_state(&self, resolved: OnboardingState) -> OnboardingState {
        let mut state = self.state.write().await;
        info!(step = %resolved.step(), "Onboarding state resolved");
        *state = resolved.clone();
        resolved
    }

    async fn require_step(
        &self,
        expected: OnboardingStep,
        action: &'static str,
    ) -> Result<OnboardingState, OnboardingError> {
        let state = self.state.read().await;
        if state.step() != expected {
            debug!(step = %state.step(), action, "Action not available in this step");
            return Err(state.invalid(action));
        }
        Ok(state.clone())
    }

    async fn stored_credential(&self) -> Result<Option<Credential>, OnboardingError> {
        self.credentials
            .get()
            .await
            .map_err(|e| OnboardingError::SubmissionFailed(e.into()))
    }

    async fn credential(&self) -> Result<Credential, OnboardingError> {
        self.stored_credential()
            .await?
            .ok_or(OnboardingError::Unauthorized)
    }

    /// Persist the new credential, then leave `Anonymous`. If the credential
    /// cannot be stored the step does not change.
    async fn establish_session(
        &self,
        session: AuthSession,
        action: &'static str,
    ) -> Result<OnboardingStep, OnboardingError> {
        let mut state = self.state.write().await;
        if state.step() != OnboardingStep::Anonymous {
            return Err(state.invalid(action));
        }

        let credential = session.credential();
        self.credentials.set(&credential).await.map_err(|e| {
            warn!(action, "Could not store credential: {}", e);
            SubmissionError::from(e)
        })?;

        state.advance_to(OnboardingStep::AuthenticatedIncompleteProfile, None)?;
        info!(user_id = %credential.user_id(), action, "Signed in");
        Ok(state.step())
    }

    async fn advance(
        &self,
        from: OnboardingStep,
        to: OnboardingStep,
        pet_id: Option<String>,
    ) -> Result<OnboardingStep, OnboardingError> {
        let mut state = self.state.write().await;
        // Another caller may have moved the flow while the request was out.
        if state.step() != from {
            return Err(state.invalid("advance"));
        }
        state.advance_to(to, pet_id)?;
        info!(from = %from, to = %to, "Onboarding advanced");
        Ok(to)
    }

    async fn call<T>(
        &self,
        cancel: &CancellationToken,
        fut: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, OnboardingError> {
        match operation::guard(cancel, self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ApiError::Unauthorized)) => {
                warn!("Server rejected the stored credential");
                Err(OnboardingError::Unauthorized)
            }
            Ok(Err(e)) => {
                warn!("Onboarding request failed: {}", e);
                Err(SubmissionError::Api(e).into())
            }
            Err(Interrupted::TimedOut(after)) => {
                warn!(timeout = ?after, "Onboarding request timed out");
                Err(SubmissionError::Api(ApiError::Timeout(after)).into())
            }
            Err(Interrupted::Cancelled) => {
                debug!("Onboarding request cancelled");
                Err(OnboardingError::Cancelled)
            }
        }
    }
}

fn validated<T>(result: Result<T, ValidationError>, action: &str) -> Result<T, OnboardingError> {
    result.map_err(|e| {
        debug!(action, "Form rejected: {}", e);
        OnboardingError::Validation(e)
    })
}
