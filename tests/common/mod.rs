//! Shared stubs for integration tests: a recording `VetApi` and a
//! credential store that refuses writes.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vetcare_client::api::{
    Appointment, AppointmentStatus, AuthSession, AuthUser, ClientProfile, ImageUpload, NewPet,
    Pet, ProfileUpdate, Report, VetApi, Veterinarian,
};
use vetcare_client::credentials::{Credential, CredentialStore};
use vetcare_client::error::{ApiError, CredentialError};
use vetcare_client::scheduling::AppointmentRequest;

/// Maximum time any test is allowed to run before we consider it hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub clinic API. Records every call by name and answers from canned data.
#[derive(Default)]
pub struct StubApi {
    calls: Mutex<Vec<&'static str>>,
    appointments: Mutex<Vec<(String, DateTime<Utc>)>>,
    pub profile: Mutex<ClientProfile>,
    pub pets: Mutex<Vec<Pet>>,
    failing: AtomicBool,
    reject_login: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl StubApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call answers with a 500.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Login answers as if the password were wrong.
    pub fn reject_login(&self) {
        self.reject_login.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    /// Every subsequent call sleeps this long before answering.
    pub fn delay(&self, by: Duration) {
        *self.delay.lock().unwrap() = Some(by);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn submitted_appointments(&self) -> Vec<(String, DateTime<Utc>)> {
        self.appointments.lock().unwrap().clone()
    }

    async fn enter(&self, name: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(name);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Server {
                status: 500,
                message: "stub failure".to_string(),
            });
        }
        Ok(())
    }
}

pub fn pet(id: &str, image: Option<&str>) -> Pet {
    Pet {
        id: id.to_string(),
        name: "Rex".to_string(),
        species: "dog".to_string(),
        age: Some(3),
        chip_number: Some("985-0001".to_string()),
        weight: Some(12.5),
        image: image.map(str::to_string),
    }
}

pub fn complete_profile() -> ClientProfile {
    ClientProfile {
        id: "u1".to_string(),
        fullname: Some("Ana Ruiz".to_string()),
        phone: Some("555-0101".to_string()),
        address: Some("Calle 1".to_string()),
        ..ClientProfile::default()
    }
}

fn session() -> AuthSession {
    AuthSession {
        token: "tok-1".to_string(),
        user: AuthUser {
            id: "u1".to_string(),
        },
    }
}

#[async_trait]
impl VetApi for StubApi {
    async fn authenticate(&self, _email: &str, _password: &str) -> Result<AuthSession, ApiError> {
        self.enter("authenticate").await?;
        if self.reject_login.load(Ordering::SeqCst) {
            return Err(ApiError::InvalidCredentials(
                "Invalid email or password".to_string(),
            ));
        }
        Ok(session())
    }

    async fn register(
        &self,
        _username: &str,
        _email: &str,
        _password: &str,
    ) -> Result<AuthSession, ApiError> {
        self.enter("register").await?;
        Ok(session())
    }

    async fn get_profile(&self, _token: &str) -> Result<ClientProfile, ApiError> {
        self.enter("get_profile").await?;
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn update_profile(&self, _token: &str, _update: &ProfileUpdate) -> Result<(), ApiError> {
        self.enter("update_profile").await
    }

    async fn upload_profile_image(
        &self,
        _token: &str,
        _image: &ImageUpload,
    ) -> Result<(), ApiError> {
        self.enter("upload_profile_image").await
    }

    async fn create_pet(&self, _token: &str, new_pet: &NewPet) -> Result<Pet, ApiError> {
        self.enter("create_pet").await?;
        Ok(Pet {
            name: new_pet.name.clone(),
            ..pet("pet-1", None)
        })
    }

    async fn upload_pet_image(
        &self,
        _token: &str,
        _pet_id: &str,
        _image: &ImageUpload,
    ) -> Result<(), ApiError> {
        self.enter("upload_pet_image").await
    }

    async fn update_pet(&self, _token: &str, _pet_id: &str, _pet: &NewPet) -> Result<(), ApiError> {
        self.enter("update_pet").await
    }

    async fn delete_pet(&self, _token: &str, _pet_id: &str) -> Result<(), ApiError> {
        self.enter("delete_pet").await
    }

    async fn get_pets_by_client(&self, _client_id: &str) -> Result<Vec<Pet>, ApiError> {
        self.enter("get_pets_by_client").await?;
        Ok(self.pets.lock().unwrap().clone())
    }

    async fn get_pet_by_id(&self, pet_id: &str) -> Result<Pet, ApiError> {
        self.enter("get_pet_by_id").await?;
        Err(ApiError::NotFound(pet_id.to_string()))
    }

    async fn get_veterinarians(&self) -> Result<Vec<Veterinarian>, ApiError> {
        self.enter("get_veterinarians").await?;
        Ok(Vec::new())
    }

    async fn get_veterinarian_by_id(&self, id: &str) -> Result<Veterinarian, ApiError> {
        self.enter("get_veterinarian_by_id").await?;
        Err(ApiError::NotFound(id.to_string()))
    }

    async fn create_appointment(
        &self,
        _token: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ApiError> {
        self.enter("create_appointment").await?;
        self.appointments
            .lock()
            .unwrap()
            .push((request.veterinarian_id().to_string(), request.when_utc()));
        Ok(Appointment {
            id: "appt-1".to_string(),
            date: request.when_utc(),
            status: AppointmentStatus::Pending,
        })
    }

    async fn get_appointments_by_client(&self, _token: &str) -> Result<Vec<Appointment>, ApiError> {
        self.enter("get_appointments_by_client").await?;
        Ok(Vec::new())
    }

    async fn get_reports_by_pet(
        &self,
        _token: &str,
        _pet_id: &str,
    ) -> Result<Vec<Report>, ApiError> {
        self.enter("get_reports_by_pet").await?;
        Ok(Vec::new())
    }

    async fn get_report_by_id(&self, _token: &str, report_id: &str) -> Result<Report, ApiError> {
        self.enter("get_report_by_id").await?;
        Err(ApiError::NotFound(report_id.to_string()))
    }

    async fn update_report(
        &self,
        _token: &str,
        report_id: &str,
        _changes: &serde_json::Value,
    ) -> Result<Report, ApiError> {
        self.enter("update_report").await?;
        Err(ApiError::NotFound(report_id.to_string()))
    }
}

/// Credential store whose disk is full: reads work, writes fail.
#[derive(Default)]
pub struct ReadOnlyStore;

#[async_trait]
impl CredentialStore for ReadOnlyStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(None)
    }

    async fn set(&self, _credential: &Credential) -> Result<(), CredentialError> {
        Err(CredentialError::Storage("disk full".to_string()))
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        Ok(())
    }
}
