#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod backend;
mod browser;
mod commands;
mod context;
mod detector;
mod driver;
mod errors;
mod focus;
mod inserter;
mod question;
mod session;
mod settings;
mod types;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const _EXIT_COMMAND_ERROR: i32 = 1;
const _EXIT_FIELD_NOT_FOUND: i32 = 2;
const _EXIT_BACKEND_FAILED: i32 = 3;
const _EXIT_WEBDRIVER_FAILED: i32 = 4;
const _EXIT_TIMEOUT: i32 = 5;

use crate::commands::config::ConfigCommands;
use types::OutputFormat;

#[derive(Parser)]
#[command(name = "fieldpilot")]
#[command(about = "Fill form fields with answers from a chat backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the editable fields on a page
    Detect {
        /// URL to scan
        url: String,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Watch a page for focus changes and new fields
    Watch {
        /// URL to watch
        url: String,

        /// How long to watch, in seconds
        #[arg(long, default_value = "30")]
        duration: u64,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Infer the question a field is asking
    Infer {
        /// URL to load
        url: String,

        /// CSS selector for the field
        selector: String,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Capture the page context that would accompany a question
    Context {
        /// URL to load
        url: String,

        /// Also capture a screenshot
        #[arg(long)]
        screenshot: bool,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Answer a field's question from the chat backend and insert the answer
    Fill {
        /// URL to load
        url: String,

        /// CSS selector for the field (omit to wait for focus)
        #[arg(long)]
        selector: Option<String>,

        /// Explicit question (overrides inference)
        #[arg(short, long)]
        question: Option<String>,

        /// How long to wait for focus when no selector is given, in seconds
        #[arg(long, default_value = "60")]
        wait: u64,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Insert literal text into a field
    Insert {
        /// URL to load
        url: String,

        /// CSS selector for the field
        selector: String,

        /// Text to insert
        text: String,

        /// Also dispatch keyup and blur events
        #[arg(long)]
        legacy_events: bool,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// List conversations on the backend
    Projects {
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Check login status against the backend
    Status {
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let result = run().await;

    // Managed drivers must not outlive the CLI process
    driver::GLOBAL_DRIVER_MANAGER.stop_all();

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(err) => {
            let err: errors::FieldpilotError = err.into();

            // Machine-readable error on stdout, human line on stderr
            let error_json = json!({
                "error": true,
                "message": err.to_string(),
                "exit_code": err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fieldpilot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            url,
            browser,
            viewport,
            no_headless,
            format,
        } => commands::detect::handle_detect(url, browser, viewport, no_headless, format).await?,

        Commands::Watch {
            url,
            duration,
            browser,
            viewport,
            no_headless,
            format,
        } => {
            commands::watch::handle_watch(url, duration, browser, viewport, no_headless, format)
                .await?
        }

        Commands::Infer {
            url,
            selector,
            browser,
            viewport,
            no_headless,
            format,
        } => {
            commands::infer::handle_infer(url, selector, browser, viewport, no_headless, format)
                .await?
        }

        Commands::Context {
            url,
            screenshot,
            browser,
            viewport,
            no_headless,
            format,
        } => {
            commands::context::handle_context(
                url, screenshot, browser, viewport, no_headless, format,
            )
            .await?
        }

        Commands::Fill {
            url,
            selector,
            question,
            wait,
            browser,
            viewport,
            no_headless,
            format,
        } => {
            commands::fill::handle_fill(
                url, selector, question, wait, browser, viewport, no_headless, format,
            )
            .await?
        }

        Commands::Insert {
            url,
            selector,
            text,
            legacy_events,
            browser,
            viewport,
            no_headless,
            format,
        } => {
            commands::insert::handle_insert(
                url,
                selector,
                text,
                legacy_events,
                browser,
                viewport,
                no_headless,
                format,
            )
            .await?
        }

        Commands::Projects { format } => commands::projects::handle_projects(format).await?,

        Commands::Status { format } => commands::status::handle_status(format).await?,

        Commands::Config { command } => commands::config::handle_config_command(command).await?,

        Commands::Version => commands::version::handle_version().await?,
    }

    Ok(())
}
