//! WebDriver process management.
//!
//! geckodriver and chromedriver are started on demand, reused while they
//! respond, and torn down when the process exits. An already-running external
//! driver on its conventional port is used as-is and never killed.

use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::BrowserType;

const READY_PROBE_ATTEMPTS: u32 = 30;
const READY_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// One spawned driver process and how to reach it
struct ManagedDriver {
    browser_type: BrowserType,
    child: Child,
    port: u16,
    #[cfg(unix)]
    group_id: i32,
}

impl ManagedDriver {
    fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    fn terminate(&mut self) {
        #[cfg(unix)]
        kill_process_group(self.group_id);
        if let Err(e) = self.child.kill() {
            debug!("Driver on port {} already gone: {}", self.port, e);
        }
    }
}

/// Starts and tracks WebDriver processes
#[derive(Default)]
pub struct DriverManager {
    drivers: Mutex<Vec<ManagedDriver>>,
}

impl DriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the URL of a responding WebDriver for the browser, starting
    /// one when neither a managed nor an external driver answers.
    pub async fn ensure_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let candidates: Vec<String> = {
            let drivers = self.drivers.lock().unwrap();
            drivers
                .iter()
                .filter(|d| d.browser_type == *browser_type)
                .map(|d| d.url())
                .collect()
        };
        for url in candidates {
            if Self::driver_ready(&url).await {
                debug!("Reusing managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        // An externally started driver on the conventional port
        let external = format!("http://localhost:{}", conventional_port(browser_type));
        if Self::driver_ready(&external).await {
            debug!("Found external WebDriver at {}", external);
            return Ok(external);
        }

        info!("No WebDriver detected for {:?}, starting one", browser_type);
        self.spawn_driver(browser_type).await
    }

    async fn spawn_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let binary = driver_binary(browser_type);
        if !Self::command_exists(binary) {
            anyhow::bail!(
                "{} not found in PATH; install it or start a WebDriver on port {} yourself",
                binary,
                conventional_port(browser_type)
            );
        }

        let port = Self::find_free_port(browser_type)?;
        info!("Starting {} on port {}", binary, port);

        let mut cmd = Command::new(binary);
        match browser_type {
            BrowserType::Firefox => cmd.args(["--port", &port.to_string()]),
            BrowserType::Chrome => cmd.arg(format!("--port={}", port)),
        };
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        // Own process group so the driver and its browser children die together
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", binary))?;
        #[cfg(unix)]
        let group_id = child.id() as i32;

        let driver = ManagedDriver {
            browser_type: *browser_type,
            child,
            port,
            #[cfg(unix)]
            group_id,
        };
        let url = driver.url();
        self.drivers.lock().unwrap().push(driver);

        for _ in 0..READY_PROBE_ATTEMPTS {
            if Self::driver_ready(&url).await {
                info!("{} ready at {}", binary, url);
                return Ok(url);
            }
            sleep(READY_PROBE_INTERVAL).await;
        }

        self.remove_driver(port);
        anyhow::bail!("{} did not become ready on port {}", binary, port)
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        let locator = "which";
        #[cfg(windows)]
        let locator = "where";

        Command::new(locator)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Pick a port: the conventional driver ports first, then whatever the
    /// OS hands out.
    pub fn find_free_port(browser_type: &BrowserType) -> Result<u16> {
        let base = conventional_port(browser_type);
        for port in base..base + 3 {
            if !Self::is_port_in_use(port) {
                return Ok(port);
            }
        }
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        Ok(listener.local_addr()?.port())
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Probe a WebDriver's /status endpoint for `value.ready`
    pub async fn driver_ready(url: &str) -> bool {
        let response = reqwest::Client::new()
            .get(format!("{}/status", url))
            .timeout(Duration::from_secs(1))
            .send()
            .await;

        let Ok(response) = response else {
            return false;
        };
        if !response.status().is_success() {
            return false;
        }
        response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body["value"]["ready"].as_bool())
            .unwrap_or(false)
    }

    /// Kill managed drivers for one browser type (bad-session recovery path)
    pub fn kill_driver(&self, browser_type: &BrowserType) {
        let mut drivers = self.drivers.lock().unwrap();
        let mut kept = Vec::new();
        for mut driver in drivers.drain(..) {
            if driver.browser_type == *browser_type {
                warn!("Killing WebDriver on port {}", driver.port);
                driver.terminate();
            } else {
                kept.push(driver);
            }
        }
        *drivers = kept;
    }

    fn remove_driver(&self, port: u16) {
        let mut drivers = self.drivers.lock().unwrap();
        if let Some(index) = drivers.iter().position(|d| d.port == port) {
            drivers.remove(index).terminate();
        }
    }

    /// Stop every managed driver. Called on process exit.
    pub fn stop_all(&self) {
        let mut drivers = self.drivers.lock().unwrap();
        for driver in drivers.iter_mut() {
            debug!("Stopping WebDriver on port {}", driver.port);
            driver.terminate();
        }
        drivers.clear();
    }
}

impl Drop for DriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn driver_binary(browser_type: &BrowserType) -> &'static str {
    match browser_type {
        BrowserType::Firefox => "geckodriver",
        BrowserType::Chrome => "chromedriver",
    }
}

fn conventional_port(browser_type: &BrowserType) -> u16 {
    match browser_type {
        BrowserType::Firefox => 4444,
        BrowserType::Chrome => 9515,
    }
}

/// SIGTERM the group, then SIGKILL whatever survived
#[cfg(unix)]
fn kill_process_group(pgid: i32) {
    let group = format!("-{}", pgid);
    let _ = Command::new("kill").args(["-TERM", &group]).output();
    std::thread::sleep(Duration::from_millis(100));
    let _ = Command::new("kill").args(["-KILL", &group]).output();
}

lazy_static::lazy_static! {
    pub static ref GLOBAL_DRIVER_MANAGER: DriverManager = DriverManager::new();
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;
