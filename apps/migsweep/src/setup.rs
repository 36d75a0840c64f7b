//! Hosting client setup and the authentication gate

use crate::error::CliError;
use migsweep_config::Config;
use migsweep_repository::{GitHubClient, HostingClient};
use std::sync::Arc;
use tracing::info;

/// An authenticated hosting client and the account it acts as
pub struct Session {
    pub host: Arc<dyn HostingClient>,
    pub login: String,
}

/// Build the GitHub client and verify the token before any repository is touched
///
/// # Errors
///
/// Returns `CliError::Authentication` if the hosting service rejects the
/// token or cannot be reached to check it.
pub async fn authenticate(config: &Config, token: &str) -> Result<Session, CliError> {
    let client = GitHubClient::from_config(&config.network, token)?;
    let login = client
        .authenticated_user()
        .await
        .map_err(CliError::Authentication)?;
    info!(login = %login, api = %config.network.api_url, "authenticated");
    Ok(Session {
        host: Arc::new(client),
        login,
    })
}
