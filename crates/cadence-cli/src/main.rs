//! Cadence - continuous integration cycles from the command line
//!
//! ## Commands
//!
//! - `integrate`: run one integration cycle for the configured project
//! - `status`: show the summary of the last completed cycle
//! - `properties`: list the integration properties a new cycle would expose
//! - `get`: resolve a property path against the project configuration

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use cadence_core::{
    BuildCondition, IntegrationProperties, IntegrationRequest, IntegrationResult, ProjectConfig,
    PropertyPath,
};
use cadence_runner::ProjectRuntime;
use cadence_state::IntegrationResultManager;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(author = "Cadence Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Continuous integration orchestration", long_about = None)]
struct Cli {
    /// Project configuration file
    #[arg(short, long, global = true, env = "CADENCE_CONFIG", default_value = "cadence.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one integration cycle
    Integrate {
        /// Build even when nothing changed
        #[arg(short, long)]
        force: bool,

        /// User requesting the build
        #[arg(short, long)]
        user: Option<String>,

        /// Where the request came from
        #[arg(long, default_value = "cli")]
        source: String,

        /// Build value passed to tasks (repeatable)
        #[arg(short = 'D', long = "define", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        defines: Vec<(String, String)>,

        /// Record and publish the cycle when source control cannot be reached
        #[arg(long)]
        publish_on_scm_error: bool,
    },

    /// Show the last completed cycle
    Status,

    /// List the properties a new cycle would expose
    Properties,

    /// Resolve a property path (e.g. `tasks[0].executable`) in the configuration
    Get {
        path: String,
    },
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    cadence_core::init_tracing(cli.json, level);

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Integrate {
            force,
            user,
            source,
            defines,
            publish_on_scm_error,
        } => {
            let condition = if force {
                BuildCondition::ForceBuild
            } else {
                BuildCondition::IfModificationExists
            };
            let request = IntegrationRequest::new(condition, source, user)
                .with_build_values(defines.into_iter().collect())
                .with_publish_on_source_control_exception(publish_on_scm_error);
            let result = cmd_integrate(config, request).await?;
            println!("{}", describe_result(&result));
            if result.status().is_broken() {
                bail!(
                    "integration {} finished with status {}",
                    result.label(),
                    result.status()
                );
            }
            Ok(())
        }
        Commands::Status => {
            println!("{}", cmd_status(config).await?);
            Ok(())
        }
        Commands::Properties => {
            print!("{}", cmd_properties(config).await?);
            Ok(())
        }
        Commands::Get { path } => {
            println!("{}", cmd_get(&config, &path)?);
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<ProjectConfig> {
    ProjectConfig::load(path).with_context(|| format!("Failed to load project config {:?}", path))
}

async fn cmd_integrate(config: ProjectConfig, request: IntegrationRequest) -> Result<IntegrationResult> {
    info!(project = %config.name, request = %request, "Integrating");
    let runtime = ProjectRuntime::from_config(config);
    runtime
        .runner
        .integrate(request)
        .await
        .context("Integration cycle failed")
}

fn describe_result(result: &IntegrationResult) -> String {
    let duration = result
        .total_integration_time()
        .map(|d| format!(" in {:.1}s", d.num_milliseconds() as f64 / 1000.0))
        .unwrap_or_default();
    format!(
        "{} {}: {}{}",
        result.project_name(),
        result.label(),
        result.status(),
        duration
    )
}

async fn cmd_status(config: ProjectConfig) -> Result<String> {
    let runtime = ProjectRuntime::from_config(config);
    let summary = runtime
        .result_manager
        .last_integration()
        .await
        .context("Failed to read integration state")?;
    serde_json::to_string_pretty(&summary).context("Failed to serialize summary")
}

async fn cmd_properties(config: ProjectConfig) -> Result<String> {
    let runtime = ProjectRuntime::from_config(config);
    let result = runtime
        .result_manager
        .start_new_integration(&IntegrationRequest::new(
            BuildCondition::ForceBuild,
            "cli",
            None,
        ))
        .await
        .context("Failed to read integration state")?;
    Ok(render_properties(&result.integration_properties()))
}

fn render_properties(properties: &IntegrationProperties) -> String {
    properties
        .iter()
        .map(|(k, v)| format!("{k}={v}\n"))
        .collect()
}

fn cmd_get(config: &ProjectConfig, path: &str) -> Result<String> {
    let value = PropertyPath::parse(path)?.resolve(config)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => serde_json::to_string_pretty(&other)?,
    })
}
