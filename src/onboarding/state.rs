//! Onboarding state machine — tracks which step the user is in.

use serde::{Deserialize, Serialize};

use crate::error::OnboardingError;

/// The steps between an anonymous visitor and the main application.
///
/// Progresses linearly: Anonymous → AuthenticatedIncompleteProfile →
/// ProfileCompleteNoPets → HasPetNoImage → Onboarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    #[default]
    Anonymous,
    AuthenticatedIncompleteProfile,
    ProfileCompleteNoPets,
    HasPetNoImage,
    Onboarded,
}

impl OnboardingStep {
    /// Check if a forward transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Anonymous, AuthenticatedIncompleteProfile)
                | (AuthenticatedIncompleteProfile, ProfileCompleteNoPets)
                | (ProfileCompleteNoPets, HasPetNoImage)
                | (HasPetNoImage, Onboarded)
        )
    }

    /// Whether onboarding is done.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Onboarded)
    }

    /// Whether a credential must exist in this step.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Get the next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Anonymous => Some(AuthenticatedIncompleteProfile),
            AuthenticatedIncompleteProfile => Some(ProfileCompleteNoPets),
            ProfileCompleteNoPets => Some(HasPetNoImage),
            HasPetNoImage => Some(Onboarded),
            Onboarded => None,
        }
    }

    /// Step reached by an explicit "go back". Leaving the session requires logout.
    pub fn previous(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            ProfileCompleteNoPets => Some(AuthenticatedIncompleteProfile),
            HasPetNoImage => Some(ProfileCompleteNoPets),
            Anonymous | AuthenticatedIncompleteProfile | Onboarded => None,
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Anonymous => "anonymous",
            Self::AuthenticatedIncompleteProfile => "authenticated_incomplete_profile",
            Self::ProfileCompleteNoPets => "profile_complete_no_pets",
            Self::HasPetNoImage => "has_pet_no_image",
            Self::Onboarded => "onboarded",
        };
        write!(f, "{s}")
    }
}

/// Current step plus the pet created in this flow, carried into the image step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnboardingState {
    step: OnboardingStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pet_id: Option<String>,
}

impl OnboardingState {
    /// A state with no pet attached. Use `with_pet` for `HasPetNoImage`.
    pub fn at(step: OnboardingStep) -> Self {
        Self { step, pet_id: None }
    }

    /// Waiting for an image of `pet_id`.
    pub fn with_pet(pet_id: impl Into<String>) -> Self {
        Self {
            step: OnboardingStep::HasPetNoImage,
            pet_id: Some(pet_id.into()),
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    /// The pet awaiting an image, only set in `HasPetNoImage`.
    pub fn pet_id(&self) -> Option<&str> {
        self.pet_id.as_deref()
    }

    /// Move forward to `target`. `pet_id` is required to enter `HasPetNoImage`
    /// and dropped everywhere else.
    pub fn advance_to(
        &mut self,
        target: OnboardingStep,
        pet_id: Option<String>,
    ) -> Result<(), OnboardingError> {
        if !self.step.can_transition_to(target) {
            return Err(self.invalid("advance"));
        }
        let pet_id = match target {
            OnboardingStep::HasPetNoImage => Some(pet_id.ok_or_else(|| self.invalid("advance"))?),
            _ => None,
        };
        self.step = target;
        self.pet_id = pet_id;
        Ok(())
    }

    /// Step back one screen. The pet id is forgotten when leaving the image step.
    pub fn go_back(&mut self) -> Result<OnboardingStep, OnboardingError> {
        let previous = self.step.previous().ok_or_else(|| self.invalid("go back"))?;
        self.step = previous;
        self.pet_id = None;
        Ok(previous)
    }

    pub(crate) fn invalid(&self, action: &'static str) -> OnboardingError {
        OnboardingError::InvalidTransition {
            state: self.step.to_string(),
            action,
        }
    }
}
