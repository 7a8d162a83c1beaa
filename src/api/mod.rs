//! Clinic API collaborator.
//!
//! `VetApi` is the request/response contract the core depends on.
//! `HttpVetApi` is the production implementation over `reqwest`; tests
//! substitute their own.

pub mod http;
pub mod models;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::scheduling::AppointmentRequest;

pub use http::HttpVetApi;
pub use models::{
    Appointment, AppointmentStatus, AuthSession, AuthUser, ClientProfile, ImageUpload, NewPet,
    Pet, ProfileUpdate, Report, Veterinarian,
};

/// Calls the clinic server. Protected calls take the bearer token explicitly.
#[async_trait]
pub trait VetApi: Send + Sync {
    // ── Authentication ──────────────────────────────────────────────

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, ApiError>;

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError>;

    // ── Profile ─────────────────────────────────────────────────────

    async fn get_profile(&self, token: &str) -> Result<ClientProfile, ApiError>;

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<(), ApiError>;

    async fn upload_profile_image(&self, token: &str, image: &ImageUpload)
    -> Result<(), ApiError>;

    // ── Pets ────────────────────────────────────────────────────────

    async fn create_pet(&self, token: &str, pet: &NewPet) -> Result<Pet, ApiError>;

    async fn upload_pet_image(
        &self,
        token: &str,
        pet_id: &str,
        image: &ImageUpload,
    ) -> Result<(), ApiError>;

    /// Replace a pet's details. Same body as creation.
    async fn update_pet(&self, token: &str, pet_id: &str, pet: &NewPet) -> Result<(), ApiError>;

    async fn delete_pet(&self, token: &str, pet_id: &str) -> Result<(), ApiError>;

    async fn get_pets_by_client(&self, client_id: &str) -> Result<Vec<Pet>, ApiError>;

    async fn get_pet_by_id(&self, pet_id: &str) -> Result<Pet, ApiError>;

    // ── Veterinarians & appointments ────────────────────────────────

    async fn get_veterinarians(&self) -> Result<Vec<Veterinarian>, ApiError>;

    async fn get_veterinarian_by_id(&self, id: &str) -> Result<Veterinarian, ApiError>;

    async fn create_appointment(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ApiError>;

    /// Appointments of the authenticated client. No appointments is an empty list.
    async fn get_appointments_by_client(&self, token: &str) -> Result<Vec<Appointment>, ApiError>;

    // ── Reports ─────────────────────────────────────────────────────

    /// Reports for a pet. No reports is an empty list.
    async fn get_reports_by_pet(&self, token: &str, pet_id: &str)
    -> Result<Vec<Report>, ApiError>;

    async fn get_report_by_id(&self, token: &str, report_id: &str) -> Result<Report, ApiError>;

    async fn update_report(
        &self,
        token: &str,
        report_id: &str,
        changes: &serde_json::Value,
    ) -> Result<Report, ApiError>;
}
