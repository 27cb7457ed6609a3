use anyhow::Result;
use serde_json::json;

use crate::commands::utils;
use crate::session::Session;
use crate::settings::SettingsStore;
use crate::types::OutputFormat;

/// Check whether the ambient session cookie is accepted by the backend
pub async fn handle_status(format: OutputFormat) -> Result<()> {
    let settings = SettingsStore::new()?.load()?;
    let session = Session::new(settings)?;
    let backend_url = session.settings().backend_url.clone();

    let logged_in = session.backend().check_login().await?;
    utils::print_result(
        format,
        &json!({
            "backend_url": &backend_url,
            "logged_in": logged_in,
        }),
        || {
            if logged_in {
                format!("Logged in to {}", backend_url)
            } else {
                format!(
                    "Not logged in to {} (set session_cookie with: fieldpilot config set session_cookie <value>)",
                    backend_url
                )
            }
        },
    )
}
