use anyhow::Result;
use clap::Subcommand;

use crate::settings::SettingsStore;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show all settings
    Show,
    /// Print one setting value
    Get {
        /// Setting key (default_project, auto_detect, backend_url, readability_url, session_cookie)
        key: String,
    },
    /// Set one setting value (empty value clears optional keys)
    Set {
        key: String,
        value: String,
    },
}

pub async fn handle_config_command(command: ConfigCommands) -> Result<()> {
    let store = SettingsStore::new()?;
    match command {
        ConfigCommands::Show => {
            let settings = store.load()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommands::Get { key } => {
            println!("{}", store.get(&key)?);
        }
        ConfigCommands::Set { key, value } => {
            store.set(&key, &value)?;
            println!("{} = {}", key, store.get(&key)?);
        }
    }
    Ok(())
}
