//! Authenticated client session — the screens after onboarding.
//!
//! Every protected call reads the token from the injected credential store
//! at call time. A missing credential fails with `Error::Unauthorized`
//! before anything is sent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{Appointment, ClientProfile, ImageUpload, Pet, Report, VetApi, Veterinarian};
use crate::config::ClientConfig;
use crate::credentials::{Credential, CredentialStore};
use crate::error::{ApiError, Error, Result, ValidationError};
use crate::onboarding::{PetForm, ProfileForm};
use crate::operation::{self, CancellationToken, Interrupted};

pub struct ClinicSession {
    api: Arc<dyn VetApi>,
    credentials: Arc<dyn CredentialStore>,
    timeout: Duration,
}

impl ClinicSession {
    pub fn new(
        api: Arc<dyn VetApi>,
        credentials: Arc<dyn CredentialStore>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            api,
            credentials,
            timeout: config.request_timeout,
        }
    }

    pub async fn profile(&self, cancel: &CancellationToken) -> Result<ClientProfile> {
        let credential = self.credential().await?;
        self.call(cancel, self.api.get_profile(credential.token()))
            .await
    }

    pub async fn upload_profile_image(
        &self,
        image: &ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if image.bytes.is_empty() {
            return Err(ValidationError::MissingField { field: "image" }.into());
        }
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api.upload_profile_image(credential.token(), image),
        )
        .await
    }

    /// Edit full name, phone and address. Same rules as during onboarding.
    pub async fn update_profile(
        &self,
        form: &ProfileForm,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let update = form.validate()?;
        let credential = self.credential().await?;
        self.call(cancel, self.api.update_profile(credential.token(), &update))
            .await?;
        info!("Profile updated");
        Ok(())
    }

    /// Register another pet.
    pub async fn add_pet(&self, form: &PetForm, cancel: &CancellationToken) -> Result<Pet> {
        let new_pet = form.validate()?;
        let credential = self.credential().await?;
        let pet = self
            .call(cancel, self.api.create_pet(credential.token(), &new_pet))
            .await?;
        info!(pet_id = %pet.id, "Pet added");
        Ok(pet)
    }

    pub async fn update_pet(
        &self,
        pet_id: &str,
        form: &PetForm,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let changes = form.validate()?;
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api.update_pet(credential.token(), pet_id, &changes),
        )
        .await
    }

    pub async fn delete_pet(&self, pet_id: &str, cancel: &CancellationToken) -> Result<()> {
        let credential = self.credential().await?;
        self.call(cancel, self.api.delete_pet(credential.token(), pet_id))
            .await?;
        info!(pet_id, "Pet deleted");
        Ok(())
    }

    /// Replace the photo of an existing pet.
    pub async fn upload_pet_image(
        &self,
        pet_id: &str,
        image: &ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if image.bytes.is_empty() {
            return Err(ValidationError::MissingField { field: "image" }.into());
        }
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api
                .upload_pet_image(credential.token(), pet_id, image),
        )
        .await
    }

    /// Pets of the signed-in client.
    pub async fn my_pets(&self, cancel: &CancellationToken) -> Result<Vec<Pet>> {
        let credential = self.credential().await?;
        self.call(cancel, self.api.get_pets_by_client(credential.user_id()))
            .await
    }

    pub async fn pet(&self, pet_id: &str, cancel: &CancellationToken) -> Result<Pet> {
        self.call(cancel, self.api.get_pet_by_id(pet_id)).await
    }

    pub async fn veterinarians(&self, cancel: &CancellationToken) -> Result<Vec<Veterinarian>> {
        self.call(cancel, self.api.get_veterinarians()).await
    }

    pub async fn veterinarian(
        &self,
        veterinarian_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Veterinarian> {
        self.call(cancel, self.api.get_veterinarian_by_id(veterinarian_id))
            .await
    }

    /// Appointments of the signed-in client; none yet is an empty list.
    pub async fn appointments(&self, cancel: &CancellationToken) -> Result<Vec<Appointment>> {
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api.get_appointments_by_client(credential.token()),
        )
        .await
    }

    pub async fn pet_reports(
        &self,
        pet_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Report>> {
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api.get_reports_by_pet(credential.token(), pet_id),
        )
        .await
    }

    pub async fn report(&self, report_id: &str, cancel: &CancellationToken) -> Result<Report> {
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api.get_report_by_id(credential.token(), report_id),
        )
        .await
    }

    /// Apply a partial update to a report. `changes` must be a JSON object.
    pub async fn update_report(
        &self,
        report_id: &str,
        changes: &serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<Report> {
        if !changes.as_object().is_some_and(|fields| !fields.is_empty()) {
            return Err(ValidationError::InvalidField {
                field: "changes",
                reason: "expected a non-empty object".to_string(),
            }
            .into());
        }
        let credential = self.credential().await?;
        self.call(
            cancel,
            self.api
                .update_report(credential.token(), report_id, changes),
        )
        .await
    }

    async fn credential(&self) -> Result<Credential> {
        self.credentials.get().await?.ok_or_else(|| {
            debug!("No stored credential, request not sent");
            Error::Unauthorized
        })
    }

    async fn call<T>(
        &self,
        cancel: &CancellationToken,
        fut: impl Future<Output = std::result::Result<T, ApiError>>,
    ) -> Result<T> {
        match operation::guard(cancel, self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(ApiError::Unauthorized)) => Err(Error::Unauthorized),
            Ok(Err(e)) => {
                warn!("Request failed: {}", e);
                Err(e.into())
            }
            Err(Interrupted::TimedOut(after)) => Err(ApiError::Timeout(after).into()),
            Err(Interrupted::Cancelled) => Err(Error::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::HttpVetApi;
    use crate::credentials::MemoryCredentialStore;

    async fn session(server: &MockServer, credential: Option<Credential>) -> ClinicSession {
        let config = ClientConfig {
            api_url: server.uri(),
            ..ClientConfig::default()
        };
        let api = Arc::new(HttpVetApi::new(&config).unwrap());
        let store = match credential {
            Some(c) => MemoryCredentialStore::with_credential(c),
            None => MemoryCredentialStore::new(),
        };
        ClinicSession::new(api, Arc::new(store), &config)
    }

    #[tokio::test]
    async fn protected_calls_need_a_credential() {
        let server = MockServer::start().await;
        let session = session(&server, None).await;
        let cancel = CancellationToken::new();

        assert!(matches!(session.appointments(&cancel).await, Err(Error::Unauthorized)));
        assert!(matches!(session.my_pets(&cancel).await, Err(Error::Unauthorized)));
        assert!(matches!(
            session
                .update_report("r1", &serde_json::json!({"notes": "ok"}), &cancel)
                .await,
            Err(Error::Unauthorized)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_use_the_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/reports/pet/p1"))
            .and(header("authorization", "Bearer tok-9"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok-9", "u1"))).await;
        let reports = session
            .pet_reports("p1", &CancellationToken::new())
            .await
            .unwrap();
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn my_pets_are_scoped_to_the_stored_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/pets/u42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pets": [{"_id": "p1", "name": "Rex", "species": "dog", "age": 3,
                          "chipNumber": "c1", "weight": 12.5}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok", "u42"))).await;
        let pets = session.my_pets(&CancellationToken::new()).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].id, "p1");
    }

    fn pet_form() -> PetForm {
        PetForm {
            name: "Luna".to_string(),
            species: "cat".to_string(),
            age: "2".to_string(),
            chip_number: "985-0002".to_string(),
            weight: "4.2".to_string(),
        }
    }

    #[tokio::test]
    async fn adding_a_pet_after_onboarding_posts_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pets"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(serde_json::json!({
                "name": "Luna", "species": "cat", "age": 2,
                "chipNumber": "985-0002", "weight": 4.2
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "pet": {"_id": "p2", "name": "Luna"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        let pet = session
            .add_pet(&pet_form(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(pet.id, "p2");
    }

    #[tokio::test]
    async fn pet_edits_are_validated_before_sending() {
        let server = MockServer::start().await;
        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        let form = PetForm {
            weight: "-1".to_string(),
            ..pet_form()
        };

        let err = session
            .update_pet("p2", &form, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::Validation(v) => assert_eq!(v.field(), Some("weight")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pet_edit_puts_to_the_pet() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/pets/p2"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        session
            .update_pet("p2", &pet_form(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn deleting_a_pet_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/pets/p2"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        session
            .delete_pet("p2", &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pet_photo_can_be_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pets/p2/upload"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        let cancel = CancellationToken::new();
        let empty = ImageUpload::new(Vec::new(), "luna.png");
        assert!(matches!(
            session.upload_pet_image("p2", &empty, &cancel).await,
            Err(Error::Validation(ValidationError::MissingField { field: "image" }))
        ));
        session
            .upload_pet_image("p2", &ImageUpload::new(vec![0x89, 0x50], "luna.png"), &cancel)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn profile_edit_requires_all_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/profile/update"))
            .and(body_json(serde_json::json!({
                "fullname": "Ana Ruiz", "phone": "555-0101", "address": "Calle 2"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        let cancel = CancellationToken::new();
        let mut form = ProfileForm {
            fullname: "Ana Ruiz".to_string(),
            phone: "555-0101".to_string(),
            address: String::new(),
        };
        assert!(matches!(
            session.update_profile(&form, &cancel).await,
            Err(Error::Validation(ValidationError::IncompleteFields { .. }))
        ));

        form.address = "Calle 2".to_string();
        session.update_profile(&form, &cancel).await.unwrap();
    }

    #[tokio::test]
    async fn pet_writes_need_a_credential() {
        let server = MockServer::start().await;
        let session = session(&server, None).await;
        let cancel = CancellationToken::new();

        assert!(matches!(session.add_pet(&pet_form(), &cancel).await, Err(Error::Unauthorized)));
        assert!(matches!(session.delete_pet("p2", &cancel).await, Err(Error::Unauthorized)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_changes_must_be_an_object() {
        let server = MockServer::start().await;
        let session = session(&server, Some(Credential::new("tok", "u1"))).await;
        let err = session
            .update_report("r1", &serde_json::json!("notes"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidField { field: "changes", .. })
        ));
    }
}
