use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::BrowserKind;
use crate::errors::{HarnessError, Result};
use crate::wait::{Probe, WaitPolicy};

/// How long a freshly spawned driver gets to answer `/status`
const DRIVER_START_TIMEOUT: Duration = Duration::from_secs(5);

/// Finds running WebDriver servers or starts one, and stops what it started
pub struct DriverManager {
    processes: Mutex<Vec<DriverProcess>>,
}

struct DriverProcess {
    kind: BrowserKind,
    child: Child,
    port: u16,
    url: String,
}

impl Default for DriverManager {
    fn default() -> Self {
        Self {
            processes: Mutex::new(Vec::new()),
        }
    }
}

impl DriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DriverProcess>> {
        self.processes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ensure a WebDriver is running for the given browser
    /// Returns the URL to connect to
    pub async fn ensure_driver(&self, kind: BrowserKind) -> Result<String> {
        let managed: Vec<String> = self
            .lock()
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.url.clone())
            .collect();

        for url in managed {
            if Self::is_driver_ready(&url).await {
                debug!("Using managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        let standard = format!("http://localhost:{}", kind.standard_port());
        if Self::is_driver_ready(&standard).await {
            debug!("Found external WebDriver at {}", standard);
            return Ok(standard);
        }

        info!("WebDriver not detected, starting {}", kind.driver_command());
        self.start_driver(kind).await
    }

    async fn start_driver(&self, kind: BrowserKind) -> Result<String> {
        let command = kind.driver_command();
        if !Self::command_exists(command) {
            return Err(HarnessError::WebDriver(format!(
                "{} not found in PATH. Install it or pass --webdriver-url",
                command
            )));
        }

        let port = Self::find_free_port(kind)?;
        let port_arg = match kind {
            BrowserKind::Firefox => vec!["--port".to_string(), port.to_string()],
            BrowserKind::Chrome => vec![format!("--port={}", port)],
        };

        let mut cmd = Command::new(command);
        cmd.args(&port_arg).stdout(Stdio::null()).stderr(Stdio::null());

        // New process group so the browser children die with the driver
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .map_err(|e| HarnessError::WebDriver(format!("Failed to start {}: {}", command, e)))?;

        let url = format!("http://localhost:{}", port);
        self.lock().push(DriverProcess {
            kind,
            child,
            port,
            url: url.clone(),
        });

        let startup = WaitPolicy::new(DRIVER_START_TIMEOUT, Duration::from_millis(100));
        let status_url = url.as_str();
        let ready = startup
            .poll(&format!("{} to accept connections", command), None, || async move {
                if Self::is_driver_running(status_url).await {
                    Ok(Probe::Ready(()))
                } else {
                    Ok(Probe::Pending)
                }
            })
            .await;

        match ready {
            Ok(()) => {
                info!("{} started on port {}", command, port);
                Ok(url)
            }
            Err(e) => {
                self.stop_port(port);
                Err(HarnessError::WebDriver(format!(
                    "{} failed to start: {}",
                    command, e
                )))
            }
        }
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        #[cfg(unix)]
        let finder = "which";
        #[cfg(windows)]
        let finder = "where";

        Command::new(finder)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Preferred driver ports first, then any port the OS hands out
    pub fn find_free_port(kind: BrowserKind) -> Result<u16> {
        let base = kind.standard_port();
        for port in [base, base + 1, base + 2] {
            if !Self::is_port_in_use(port) {
                return Ok(port);
            }
            debug!("Port {} is in use", port);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .map_err(|e| HarnessError::Other(e.into()))?;
        let port = listener
            .local_addr()
            .map_err(|e| HarnessError::Other(e.into()))?
            .port();
        Ok(port)
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Check if something answers the WebDriver status endpoint
    pub async fn is_driver_running(url: &str) -> bool {
        match reqwest::Client::new()
            .get(format!("{}/status", url))
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Running and reporting `ready: true`
    pub async fn is_driver_ready(url: &str) -> bool {
        let response = match reqwest::Client::new()
            .get(format!("{}/status", url))
            .timeout(Duration::from_secs(1))
            .send()
            .await
        {
            Ok(response) => response,
            Err(_) => return false,
        };

        match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("value")
                .and_then(|v| v.get("ready"))
                .and_then(|r| r.as_bool())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Stop every managed driver for `kind`
    pub fn kill_driver(&self, kind: BrowserKind) {
        let mut processes = self.lock();
        let (doomed, kept): (Vec<_>, Vec<_>) = processes.drain(..).partition(|p| p.kind == kind);
        *processes = kept;
        drop(processes);

        for process in doomed {
            Self::terminate(process);
        }
    }

    fn stop_port(&self, port: u16) {
        let mut processes = self.lock();
        if let Some(index) = processes.iter().position(|p| p.port == port) {
            let process = processes.remove(index);
            drop(processes);
            Self::terminate(process);
        }
    }

    fn terminate(mut process: DriverProcess) {
        debug!("Stopping {} on port {}", process.kind.driver_command(), process.port);

        #[cfg(unix)]
        {
            let pgid = process.child.id();
            if let Err(e) = Command::new("kill")
                .args(["-TERM", &format!("-{}", pgid)])
                .output()
            {
                debug!("Failed to signal process group {}: {}", pgid, e);
            }
        }

        if let Err(e) = process.child.kill() {
            debug!("Driver on port {} already exited: {}", process.port, e);
        }
        if let Err(e) = process.child.wait() {
            warn!("Could not reap driver on port {}: {}", process.port, e);
        }
    }

    /// Stop all managed WebDriver processes
    pub fn stop_all(&self) {
        let doomed: Vec<DriverProcess> = self.lock().drain(..).collect();
        for process in doomed {
            Self::terminate(process);
        }
    }

    pub fn managed_count(&self) -> usize {
        self.lock().len()
    }
}

impl Drop for DriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

// Global WebDriver manager instance
lazy_static::lazy_static! {
    pub static ref GLOBAL_DRIVER_MANAGER: DriverManager = DriverManager::new();
}

#[cfg(test)]
#[path = "driver_manager_test.rs"]
mod driver_manager_test;
