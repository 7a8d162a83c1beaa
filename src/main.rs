use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use vetcare_client::api::HttpVetApi;
use vetcare_client::config::ClientConfig;
use vetcare_client::credentials::FileCredentialStore;
use vetcare_client::onboarding::{OnboardingController, OnboardingStep};
use vetcare_client::operation::CancellationToken;
use vetcare_client::session::ClinicSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ClientConfig::from_env().context("invalid client configuration")?;

    eprintln!("VetCare client v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.api_url);
    eprintln!("   Credential: {}", config.credential_path.display());

    let api = Arc::new(HttpVetApi::new(&config).context("failed to build HTTP client")?);
    let credentials = Arc::new(FileCredentialStore::new(&config.credential_path));

    // Ctrl-C abandons the in-flight request
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let onboarding = OnboardingController::new(api.clone(), credentials.clone(), &config);
    let state = onboarding
        .resolve_current_state(&cancel)
        .await
        .context("could not resolve onboarding state")?;

    match state.step() {
        OnboardingStep::Anonymous => eprintln!("   Not signed in: register or log in."),
        OnboardingStep::AuthenticatedIncompleteProfile => {
            eprintln!("   Complete your profile to continue.")
        }
        OnboardingStep::ProfileCompleteNoPets => eprintln!("   Register your first pet."),
        OnboardingStep::HasPetNoImage => eprintln!(
            "   Add a photo of pet {}.",
            state.pet_id().unwrap_or("?")
        ),
        OnboardingStep::Onboarded => {
            let session = ClinicSession::new(api, credentials, &config);
            let appointments = session
                .appointments(&cancel)
                .await
                .context("could not load appointments")?;
            info!(count = appointments.len(), "Appointments loaded");
            eprintln!("   Onboarded. {} appointment(s) on file.", appointments.len());
        }
    }

    Ok(())
}
