//! `lecture-sync` command line entry point
//!
//! Wires the desktop bridge, both providers and the sync core together,
//! then performs a single sync run.

mod cli;

use anyhow::{Context, Result};
use bridge_desktop::{FileSecureStore, LoopbackPrompt, ReqwestHttpClient};
use bridge_traits::auth::AuthorizationPrompt;
use bridge_traits::http::HttpClient;
use bridge_traits::storage::SecureStore;
use clap::Parser;
use core_auth::{
    ClientSecrets, CredentialProvider, LoopbackAuthorizer, OAuthConfig, OAuthFlowManager,
    PersistentCredentialProvider, TokenStore,
};
use core_sync::SyncCoordinator;
use provider_google_drive::GoogleDriveConnector;
use provider_panopto::{PanoptoConnector, PanoptoCredentials, PanoptoEndpoints};
use std::sync::Arc;
use tracing::info;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    core_runtime::logging::init_logging(cli.logging_config())
        .context("Failed to initialize logging")?;

    let config = cli.archive_config().context("Invalid configuration")?;
    let http_client: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new().context("Failed to create HTTP client")?);

    let drive_credentials = drive_credentials(&cli, Arc::clone(&http_client)).await?;
    drive_credentials
        .access_token()
        .await
        .context("Google Drive authorization failed")?;

    let panopto_credentials = PanoptoCredentials::new(
        cli.panopto_username.clone().unwrap_or_default(),
        cli.panopto_password.clone().unwrap_or_default(),
    )?;
    let panopto = PanoptoConnector::new(Arc::clone(&http_client))
        .with_endpoints(PanoptoEndpoints::default().with_base_url(&cli.panopto_base_url))
        .with_page_size(config.page_size)
        .with_skip_unlistable_folders(config.skip_unlistable_folders);
    panopto
        .sign_in(&panopto_credentials)
        .await
        .context("Panopto sign-in failed")?;

    let drive = GoogleDriveConnector::new(http_client, drive_credentials)
        .with_chunk_size(config.upload_chunk_size);

    let coordinator = SyncCoordinator::new(Arc::new(panopto), Arc::new(drive), config)?;
    let report = coordinator.run().await.context("Sync run failed")?;

    info!(%report, "Archive is up to date");
    Ok(())
}

/// Token provider for Drive: stored token, refreshed or re-authorized in the
/// browser as needed.
async fn drive_credentials(
    cli: &Cli,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn CredentialProvider>> {
    let secrets_json = tokio::fs::read_to_string(&cli.credentials)
        .await
        .with_context(|| format!("Cannot read OAuth client secrets {}", cli.credentials.display()))?;
    let secrets = ClientSecrets::from_json(&secrets_json)?;

    let mut prompt = LoopbackPrompt::bind(cli.oauth_port)
        .await
        .context("Cannot listen for the OAuth redirect")?;
    if cli.no_browser {
        prompt = prompt.without_browser();
    }

    let flow = Arc::new(OAuthFlowManager::new(
        OAuthConfig::google_drive(secrets, prompt.redirect_uri()),
        http_client,
    ));
    let authorizer = Arc::new(LoopbackAuthorizer::new(Arc::clone(&flow), Arc::new(prompt)));
    let store = TokenStore::new(secure_store(cli)?);

    Ok(Arc::new(PersistentCredentialProvider::new(flow, store, authorizer)))
}

fn secure_store(cli: &Cli) -> Result<Arc<dyn SecureStore>> {
    if cli.keyring {
        #[cfg(feature = "keyring")]
        return Ok(Arc::new(bridge_desktop::KeyringSecureStore::new()));

        #[cfg(not(feature = "keyring"))]
        anyhow::bail!("--keyring needs a build with the `keyring` feature");
    }

    let path = match &cli.token_file {
        Some(path) => path.clone(),
        None => FileSecureStore::default_path()?,
    };
    info!(path = %path.display(), "Using token file");
    Ok(Arc::new(FileSecureStore::new(path)))
}
