use anyhow::Result;
use serde_json::json;

use crate::commands::utils;
use crate::session::Session;
use crate::settings::SettingsStore;
use crate::types::OutputFormat;

/// List conversations on the backend ("projects")
pub async fn handle_projects(format: OutputFormat) -> Result<()> {
    let settings = SettingsStore::new()?.load()?;
    let mut session = Session::new(settings)?;
    let default_project = session.settings().default_project.clone();

    let projects = session.projects().await?;
    utils::print_result(
        format,
        &json!({ "projects": projects, "default": &default_project }),
        || {
            if projects.is_empty() {
                return "No conversations".to_string();
            }
            let mut out = String::new();
            for p in projects {
                let marker = if Some(&p.id) == default_project.as_ref() {
                    "*"
                } else {
                    " "
                };
                out.push_str(&format!("{} {}  {}\n", marker, p.id, p.name));
            }
            out.trim_end().to_string()
        },
    )
}
