#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartprobe::driver_manager::{DriverManager, GLOBAL_DRIVER_MANAGER};
use cartprobe::{
    BrowserKind, HarnessConfig, HarnessError, OutputFormat, Scenario, Session, SuiteRunner,
    ViewportSize, format_currency,
};

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "cartprobe")]
#[command(about = "End-to-end shopping cart checks for an online bookstore", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cart scenarios against the storefront
    Run {
        /// Scenario to run (repeatable; all scenarios when omitted)
        #[arg(short, long = "scenario", value_enum)]
        scenarios: Vec<Scenario>,

        /// Browser to use
        #[arg(short, long)]
        browser: Option<BrowserKind>,

        /// Show the browser window
        #[arg(long)]
        no_headless: bool,

        /// Config file (defaults to ~/.cartprobe/config.json when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Storefront base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Default wait timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
        #[arg(long)]
        viewport: Option<String>,

        /// Connect to this WebDriver instead of finding or starting one
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// List available scenarios
    List {
        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },

    /// Render an amount the way the storefront displays prices
    Price {
        /// Amount in whole rupiah
        amount: u64,
    },

    /// Report whether chromedriver and geckodriver are installed and running
    DriverStatus {
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    // Always clean up WebDriver processes before exiting
    GLOBAL_DRIVER_MANAGER.stop_all();

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let harness_err: HarnessError = err.into();

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": harness_err.to_string(),
                "exit_code": harness_err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            eprintln!("Error: {}", harness_err);
            std::process::exit(harness_err.exit_code());
        }
    }
}

async fn run() -> Result<i32> {
    // Initialize tracing to stderr (so JSON output to stdout remains clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cartprobe=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenarios,
            browser,
            no_headless,
            config,
            base_url,
            timeout,
            viewport,
            webdriver_url,
            format,
        } => {
            let mut harness = HarnessConfig::load(config.as_deref())?;
            if let Some(kind) = browser {
                harness.browser.kind = kind;
            }
            if no_headless {
                harness.browser.headless = false;
            }
            if let Some(url) = base_url {
                harness.site.base_url = url;
            }
            if let Some(secs) = timeout {
                harness.wait.timeout_secs = secs;
            }
            if let Some(vp) = viewport {
                harness.browser.viewport = Some(ViewportSize::parse(&vp)?);
            }
            if let Some(url) = webdriver_url {
                harness.browser.webdriver_url = Some(url);
            }
            harness.validate()?;

            let scenarios = if scenarios.is_empty() {
                Scenario::ALL.to_vec()
            } else {
                scenarios
            };
            SuiteRunner::preflight(&harness, &scenarios)?;

            let session = Session::start(&harness).await?;
            let report = SuiteRunner::new(&session, &harness).run(&scenarios).await;
            if let Err(e) = session.close().await {
                warn!("Failed to close browser session: {}", e);
            }

            print!("{}", report.render(format)?);
            if format == OutputFormat::Json {
                println!();
            }
            Ok(report.exit_code())
        }

        Commands::List { format } => {
            match format {
                OutputFormat::Json => {
                    let list: Vec<_> = Scenario::ALL
                        .iter()
                        .map(|s| {
                            json!({
                                "id": s.id(),
                                "title": s.title(),
                                "needs_login": s.needs_login(),
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&list)?);
                }
                OutputFormat::Simple => {
                    for scenario in Scenario::ALL {
                        println!("{:<14} {}", scenario.id(), scenario.title());
                    }
                }
            }
            Ok(EXIT_SUCCESS)
        }

        Commands::Price { amount } => {
            println!("{}", format_currency(amount));
            Ok(EXIT_SUCCESS)
        }

        Commands::DriverStatus { format } => {
            let mut drivers = Vec::new();
            for kind in [BrowserKind::Chrome, BrowserKind::Firefox] {
                let url = format!("http://localhost:{}", kind.standard_port());
                drivers.push(json!({
                    "browser": kind,
                    "command": kind.driver_command(),
                    "installed": DriverManager::command_exists(kind.driver_command()),
                    "url": url,
                    "ready": DriverManager::is_driver_ready(&url).await,
                }));
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&drivers)?),
                OutputFormat::Simple => {
                    for driver in &drivers {
                        println!(
                            "{}: installed={} ready={} ({})",
                            driver["command"].as_str().unwrap_or_default(),
                            driver["installed"],
                            driver["ready"],
                            driver["url"].as_str().unwrap_or_default()
                        );
                    }
                }
            }
            Ok(EXIT_SUCCESS)
        }
    }
}
