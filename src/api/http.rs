//! `reqwest`-backed implementation of the clinic API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::VetApi;
use super::models::{
    Appointment, AuthSession, ClientProfile, ImageUpload, NewPet, Pet, ProfileUpdate, Report,
    Veterinarian,
};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::scheduling::AppointmentRequest;

/// Every account created or authenticated from this client is a pet owner.
const USER_TYPE: &str = "client";

/// HTTP client for the clinic server.
pub struct HttpVetApi {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: ClientProfile,
}

#[derive(Deserialize)]
struct PetEnvelope {
    pet: Pet,
}

#[derive(Deserialize)]
struct PetsEnvelope {
    #[serde(default)]
    pets: Vec<Pet>,
}

#[derive(Deserialize)]
struct ReportEnvelope {
    report: Report,
}

#[derive(Deserialize)]
struct ReportsEnvelope {
    #[serde(default)]
    reports: Vec<Report>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AppointmentEnvelope {
    Wrapped { appointment: Appointment },
    Bare(Appointment),
}

impl HttpVetApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::from(e)
        }
    }

    /// Send a request and turn any non-2xx status into a typed error.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(response).await;
        let err = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_client_error() => ApiError::Rejected(message),
            s => ApiError::Server {
                status: s.as_u16(),
                message,
            },
        };
        debug!(status = status.as_u16(), "Clinic API returned {}", err);
        Err(err)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|e| self.transport_error(e))
    }

    /// A list endpoint where 404 means "nothing yet" rather than failure.
    async fn list_or_empty<T, E>(
        &self,
        request: RequestBuilder,
        unwrap: impl FnOnce(E) -> Vec<T>,
    ) -> Result<Vec<T>, ApiError>
    where
        E: DeserializeOwned,
    {
        match self.json::<E>(request).await {
            Ok(envelope) => Ok(unwrap(envelope)),
            Err(ApiError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn image_form(field: &'static str, image: &ImageUpload) -> Result<Form, ApiError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| ApiError::Rejected(format!("Invalid image type {}: {e}", image.mime_type)))?;
        Ok(Form::new().part(field, part))
    }

    fn authed(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request.bearer_auth(token)
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) if !body.trim().is_empty() => body,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[async_trait]
impl VetApi for HttpVetApi {
    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "userType": USER_TYPE,
        });
        let request = self.client.post(self.url("/api/auth/login")).json(&body);
        match self.json::<AuthSession>(request).await {
            Ok(session) => Ok(session),
            Err(ApiError::Unauthorized) => Err(ApiError::InvalidCredentials(
                "Invalid email or password".to_string(),
            )),
            Err(ApiError::Rejected(message)) | Err(ApiError::NotFound(message)) => {
                Err(ApiError::InvalidCredentials(message))
            }
            Err(e) => {
                warn!("Login request failed: {}", e);
                Err(e)
            }
        }
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
            "userType": USER_TYPE,
        });
        let request = self.client.post(self.url("/api/auth/register")).json(&body);
        self.json(request).await
    }

    async fn get_profile(&self, token: &str) -> Result<ClientProfile, ApiError> {
        let request = self.authed(self.client.get(self.url("/api/auth/profile")), token);
        let envelope: UserEnvelope = self.json(request).await?;
        Ok(envelope.user)
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<(), ApiError> {
        let request = self
            .authed(self.client.put(self.url("/api/profile/update")), token)
            .json(update);
        self.send(request).await?;
        Ok(())
    }

    async fn upload_profile_image(
        &self,
        token: &str,
        image: &ImageUpload,
    ) -> Result<(), ApiError> {
        let form = Self::image_form("profileImage", image)?;
        let request = self
            .authed(self.client.post(self.url("/api/profile/upload")), token)
            .multipart(form);
        self.send(request).await?;
        Ok(())
    }

    async fn create_pet(&self, token: &str, pet: &NewPet) -> Result<Pet, ApiError> {
        let request = self
            .authed(self.client.post(self.url("/api/pets")), token)
            .json(pet);
        let envelope: PetEnvelope = self.json(request).await?;
        Ok(envelope.pet)
    }

    async fn upload_pet_image(
        &self,
        token: &str,
        pet_id: &str,
        image: &ImageUpload,
    ) -> Result<(), ApiError> {
        let form = Self::image_form("petImage", image)?;
        let request = self
            .authed(
                self.client.post(self.url(&format!("/api/pets/{pet_id}/upload"))),
                token,
            )
            .multipart(form);
        self.send(request).await?;
        Ok(())
    }

    async fn update_pet(&self, token: &str, pet_id: &str, pet: &NewPet) -> Result<(), ApiError> {
        let request = self
            .authed(self.client.put(self.url(&format!("/api/pets/{pet_id}"))), token)
            .json(pet);
        self.send(request).await?;
        Ok(())
    }

    async fn delete_pet(&self, token: &str, pet_id: &str) -> Result<(), ApiError> {
        let request = self.authed(
            self.client.delete(self.url(&format!("/api/pets/{pet_id}"))),
            token,
        );
        self.send(request).await?;
        Ok(())
    }

    async fn get_pets_by_client(&self, client_id: &str) -> Result<Vec<Pet>, ApiError> {
        let request = self.client.get(self.url(&format!("/api/pets/{client_id}")));
        self.list_or_empty(request, |e: PetsEnvelope| e.pets).await
    }

    async fn get_pet_by_id(&self, pet_id: &str) -> Result<Pet, ApiError> {
        let request = self.client.get(self.url(&format!("/api/pets/pet/{pet_id}")));
        let envelope: PetEnvelope = self.json(request).await?;
        Ok(envelope.pet)
    }

    async fn get_veterinarians(&self) -> Result<Vec<Veterinarian>, ApiError> {
        self.json(self.client.get(self.url("/api/veterinarians")))
            .await
    }

    async fn get_veterinarian_by_id(&self, id: &str) -> Result<Veterinarian, ApiError> {
        self.json(self.client.get(self.url(&format!("/api/veterinarians/{id}"))))
            .await
    }

    async fn create_appointment(
        &self,
        token: &str,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ApiError> {
        let body = serde_json::json!({
            "idVeterinarian": request.veterinarian_id(),
            "date": request.when_utc(),
        });
        let http = self
            .authed(self.client.post(self.url("/api/appointments")), token)
            .json(&body);
        match self.json::<AppointmentEnvelope>(http).await? {
            AppointmentEnvelope::Wrapped { appointment } | AppointmentEnvelope::Bare(appointment) => {
                Ok(appointment)
            }
        }
    }

    async fn get_appointments_by_client(&self, token: &str) -> Result<Vec<Appointment>, ApiError> {
        let request = self.authed(self.client.get(self.url("/api/appointments/client")), token);
        self.list_or_empty(request, |list: Vec<Appointment>| list)
            .await
    }

    async fn get_reports_by_pet(
        &self,
        token: &str,
        pet_id: &str,
    ) -> Result<Vec<Report>, ApiError> {
        let request = self.authed(
            self.client.get(self.url(&format!("/api/reports/pet/{pet_id}"))),
            token,
        );
        self.list_or_empty(request, |e: ReportsEnvelope| e.reports)
            .await
    }

    async fn get_report_by_id(&self, token: &str, report_id: &str) -> Result<Report, ApiError> {
        let request = self.authed(
            self.client.get(self.url(&format!("/api/reports/{report_id}"))),
            token,
        );
        let envelope: ReportEnvelope = self.json(request).await?;
        Ok(envelope.report)
    }

    async fn update_report(
        &self,
        token: &str,
        report_id: &str,
        changes: &serde_json::Value,
    ) -> Result<Report, ApiError> {
        let request = self
            .authed(
                self.client.put(self.url(&format!("/api/reports/{report_id}"))),
                token,
            )
            .json(changes);
        let envelope: ReportEnvelope = self.json(request).await?;
        Ok(envelope.report)
    }
}
