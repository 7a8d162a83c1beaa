//! Onboarding flow — from anonymous visitor to a client with a pet on file.
//!
//! Each step is gated on the stored credential and on the server accepting
//! the step's submission. Only the credential survives a restart; the step
//! is recomputed from the server with `resolve_current_state`.

pub mod controller;
pub mod forms;
pub mod state;

pub use controller::OnboardingController;
pub use forms::{LoginForm, PetForm, ProfileForm, RegistrationForm};
pub use state::{OnboardingState, OnboardingStep};
