//! Sequential scenario runner and its report

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, Result};
use crate::flows::{FlowStage, Scenario, Storefront};
use crate::session::Session;
use crate::types::OutputFormat;

/// Result of one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub id: String,
    pub title: String,
    pub passed: bool,
    /// Last stage completed when the scenario failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FlowStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
}

impl ScenarioOutcome {
    fn from_result(
        scenario: Scenario,
        result: &Result<()>,
        started_at: DateTime<Utc>,
        elapsed_ms: u64,
    ) -> Self {
        let (stage, error, exit_code) = match result {
            Ok(()) => (None, None, 0),
            Err(e) => {
                let stage = match e {
                    HarnessError::Scenario { stage, .. } => Some(*stage),
                    _ => None,
                };
                (stage, Some(e.to_string()), e.exit_code())
            }
        };
        ScenarioOutcome {
            id: scenario.id().to_string(),
            title: scenario.title().to_string(),
            passed: result.is_ok(),
            stage,
            error,
            exit_code,
            duration_ms: elapsed_ms,
            started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub run_id: Uuid,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<ScenarioOutcome>,
    /// Scenarios never started because the run was interrupted
    pub skipped: Vec<String>,
    pub interrupted: bool,
}

impl SuiteReport {
    fn new(base_url: &str) -> Self {
        let now = Utc::now();
        SuiteReport {
            run_id: Uuid::new_v4(),
            base_url: base_url.to_string(),
            started_at: now,
            finished_at: now,
            outcomes: Vec::new(),
            skipped: Vec::new(),
            interrupted: false,
        }
    }

    /// Mark the run interrupted with `rest` never started
    fn skip_from(&mut self, rest: &[Scenario]) {
        warn!("Run interrupted, skipping {} remaining scenario(s)", rest.len());
        self.interrupted = true;
        self.skipped = rest.iter().map(|s| s.id().to_string()).collect();
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn success(&self) -> bool {
        !self.interrupted && self.failed() == 0
    }

    /// 130 when interrupted, else the first failure's code, else 0
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            return 130;
        }
        self.outcomes
            .iter()
            .find(|o| !o.passed)
            .map(|o| o.exit_code)
            .unwrap_or(0)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Simple => {
                let mut out = String::new();
                for outcome in &self.outcomes {
                    let status = if outcome.passed { "PASS" } else { "FAIL" };
                    out.push_str(&format!(
                        "{} {} {} ({:.1}s)\n",
                        status,
                        outcome.id,
                        outcome.title,
                        outcome.duration_ms as f64 / 1000.0
                    ));
                    if let Some(error) = &outcome.error {
                        out.push_str(&format!("     {}\n", error));
                    }
                }
                for id in &self.skipped {
                    out.push_str(&format!("SKIP {}\n", id));
                }
                out.push_str(&format!(
                    "{} passed, {} failed{}\n",
                    self.passed(),
                    self.failed(),
                    if self.interrupted { " (interrupted)" } else { "" }
                ));
                Ok(out)
            }
        }
    }
}

/// Fires the trigger half of [`Interrupt::manual`]
pub struct InterruptTrigger(watch::Sender<bool>);

impl InterruptTrigger {
    pub fn fire(&self) {
        let _ = self.0.send(true);
    }
}

/// Latched cancellation signal that lives for a whole run
///
/// Once fired it stays fired, so a Ctrl-C that lands between scenarios or
/// during cart cleanup is still seen by the next check.
pub struct Interrupt {
    fired: watch::Receiver<bool>,
    listener: Option<JoinHandle<()>>,
}

impl Interrupt {
    /// Latch on the process receiving Ctrl-C
    pub fn ctrl_c() -> Self {
        let (tx, rx) = watch::channel(false);
        let listener = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Ctrl-C received, stopping the run");
                    let _ = tx.send(true);
                }
                Err(e) => {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                    // Holding the sender keeps `fired()` pending
                    std::future::pending::<()>().await;
                    drop(tx);
                }
            }
        });
        Interrupt {
            fired: rx,
            listener: Some(listener),
        }
    }

    /// Latch fired by hand through the returned trigger
    pub fn manual() -> (Self, InterruptTrigger) {
        let (tx, rx) = watch::channel(false);
        (
            Interrupt {
                fired: rx,
                listener: None,
            },
            InterruptTrigger(tx),
        )
    }

    pub fn is_fired(&self) -> bool {
        *self.fired.borrow()
    }

    /// Resolves once fired; never resolves if the trigger is gone unfired
    pub async fn fired(&self) {
        let mut rx = self.fired.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Runs scenarios one after another on a single session
pub struct SuiteRunner<'a> {
    session: &'a Session,
    config: &'a HarnessConfig,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(session: &'a Session, config: &'a HarnessConfig) -> Self {
        SuiteRunner { session, config }
    }

    /// Fail fast on configuration the selected scenarios cannot run without
    pub fn preflight(config: &HarnessConfig, scenarios: &[Scenario]) -> Result<()> {
        if scenarios.is_empty() {
            return Err(HarnessError::Config("No scenarios selected".to_string()));
        }
        if scenarios.iter().any(|s| s.needs_login()) {
            config.require_credentials()?;
        }
        Ok(())
    }

    /// Run `scenarios` in order, stopping on Ctrl-C
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let interrupt = Interrupt::ctrl_c();
        self.run_with(scenarios, &interrupt).await
    }

    /// Run `scenarios` in order, clearing the cart after each one that used it
    ///
    /// When `interrupt` fires the running scenario fails with `Interrupted`,
    /// cleanup is abandoned and the remaining scenarios are skipped.
    pub async fn run_with(&self, scenarios: &[Scenario], interrupt: &Interrupt) -> SuiteReport {
        let mut report = SuiteReport::new(&self.config.site.base_url);
        let mut storefront = Storefront::new(self.session, self.config);
        info!("Run {}: {} scenario(s)", report.run_id, scenarios.len());

        for (index, scenario) in scenarios.iter().copied().enumerate() {
            if interrupt.is_fired() {
                report.skip_from(&scenarios[index..]);
                break;
            }

            let started_at = Utc::now();
            let clock = Instant::now();

            let result = tokio::select! {
                result = storefront.execute(scenario) => result,
                () = interrupt.fired() => Err(HarnessError::Interrupted(format!(
                    "{} cancelled by user",
                    scenario.id()
                ))),
            };
            let result = match result {
                Err(e @ HarnessError::Interrupted(_)) => Err(HarnessError::Scenario {
                    id: scenario.id().to_string(),
                    stage: storefront.stage(),
                    source: Box::new(e),
                }),
                other => other,
            };

            let outcome = ScenarioOutcome::from_result(
                scenario,
                &result,
                started_at,
                clock.elapsed().as_millis() as u64,
            );
            report.outcomes.push(outcome);

            if result.as_ref().is_err_and(|e| e.is_interrupted()) {
                report.skip_from(&scenarios[index + 1..]);
                break;
            }

            if scenario.touches_cart() {
                tokio::select! {
                    cleared = storefront.cart().remove_all_products() => {
                        if let Err(e) = cleared {
                            warn!("Could not clear the cart after {}: {}", scenario.id(), e);
                        }
                    }
                    () = interrupt.fired() => {
                        warn!("Interrupted while clearing the cart after {}", scenario.id());
                    }
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            "Run {} finished: {} passed, {} failed",
            report.run_id,
            report.passed(),
            report.failed()
        );
        report
    }
}

#[cfg(test)]
#[path = "suite_test.rs"]
mod suite_test;
