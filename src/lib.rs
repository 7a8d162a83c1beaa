//! VetCare client core — appointment scheduling and client onboarding.

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod onboarding;
pub mod operation;
pub mod scheduling;
pub mod session;
