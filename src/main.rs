use std::path::PathBuf;

use clap::Parser;
use job_janitor::{
    cluster::KubeJobClient,
    config::{self, ConfigOverrides, JanitorConfig, ReportFormat},
    observability::{self, metrics},
    retention::{self, RunConfig, RunReport},
};

/// CLI arguments for the job janitor
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Delete old, completed Kubernetes Jobs while keeping the most recent ones",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a TOML config file (defaults are used if omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Kubernetes namespace
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Label selector to match (empty matches all Jobs)
    #[arg(short, long = "label", global = true)]
    label_selector: Option<String>,

    /// Number of Jobs to remain
    #[arg(long, global = true)]
    max_count: Option<usize>,

    /// Only do a dry run (`--dry-run=false` to delete for real)
    #[arg(long, global = true, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    dry_run: Option<bool>,

    /// Use the in-cluster service account (`--in-cluster=false` to use a kubeconfig)
    #[arg(long, global = true, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    in_cluster: Option<bool>,

    /// Path to the kubeconfig file, used when not running in-cluster
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    context: Option<String>,

    /// Exit with status 2 if any individual deletion fails
    #[arg(long, global = true)]
    fail_on_delete_error: bool,

    /// Report format printed to stdout
    #[arg(short = 'o', long = "output", global = true, value_enum)]
    format: Option<ReportFormat>,
}

impl From<RunArgs> for ConfigOverrides {
    fn from(args: RunArgs) -> Self {
        Self {
            namespace: args.namespace,
            label_selector: args.label_selector,
            max_count: args.max_count,
            dry_run: args.dry_run,
            in_cluster: args.in_cluster,
            kubeconfig: args.kubeconfig,
            context: args.context,
            fail_on_delete_error: args.fail_on_delete_error,
            report_format: args.format,
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Run a single retention pass (default)
    Run,
    /// Initialize a new configuration file
    Init {
        /// Path to create the config file
        #[arg(long, default_value = "job-janitor.toml")]
        path: PathBuf,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Export the JSON schema for the configuration file
    Schema {
        /// Output file (defaults to stdout)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Init { path, force }) => run_init(path, force),
        Some(Command::Schema { path }) => {
            #[cfg(feature = "json-schema")]
            run_schema_export(path);
            #[cfg(not(feature = "json-schema"))]
            {
                let _ = path;
                eprintln!("Error: JSON schema export requires the 'json-schema' feature");
                std::process::exit(1);
            }
        }
        Some(Command::Run) | None => {
            let code = run(args.config.as_deref(), args.run.into()).await;
            std::process::exit(code);
        }
    }
}

/// Run one retention pass and return the process exit code.
async fn run(config_path: Option<&str>, overrides: ConfigOverrides) -> i32 {
    let config = match load_config(config_path, overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        return 1;
    }
    if let Err(e) = metrics::init_metrics(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to initialize metrics, continuing without them");
    }

    tracing::info!(
        in_cluster = config.cluster.in_cluster,
        namespace = %config.cluster.namespace,
        label_selector = %config.cluster.label_selector,
        dry_run = config.retention.dry_run,
        max_count = config.retention.max_count,
        "Loaded configuration"
    );

    let client = match KubeJobClient::from_config(&config.cluster).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create Kubernetes client");
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let run_config = RunConfig::from(&config);
    let report = match retention::run_retention(&run_config, &client, &client).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Retention run aborted");
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match render_report(&report, config.report.format) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize run report");
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    if let Err(e) = metrics::write_textfile(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to write metrics textfile");
    }

    let code = report.exit_code(config.retention.fail_on_delete_error);
    if code != 0 {
        tracing::warn!(
            failed = report.execution.failed(),
            exit_code = code,
            "Some deletions failed"
        );
    }
    code
}

fn render_report(report: &RunReport, format: ReportFormat) -> serde_json::Result<String> {
    match format {
        ReportFormat::Text => Ok(report.to_string()),
        ReportFormat::Json => report.to_json(),
    }
}

fn load_config(
    config_path: Option<&str>,
    overrides: ConfigOverrides,
) -> Result<JanitorConfig, config::ConfigError> {
    let config = match config_path {
        Some(path) => JanitorConfig::from_file(path)?,
        None => JanitorConfig::default(),
    };
    config.with_overrides(overrides)
}

/// Write the default configuration file.
fn run_init(path: PathBuf, force: bool) {
    if path.exists() && !force {
        eprintln!(
            "Config file already exists: {}\nUse --force to overwrite.",
            path.display()
        );
        std::process::exit(1);
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        eprintln!("Failed to create directory {}: {}", parent.display(), e);
        std::process::exit(1);
    }

    if let Err(e) = std::fs::write(&path, config::default_config_toml()) {
        eprintln!("Failed to write config file: {}", e);
        std::process::exit(1);
    }

    println!("Created config file: {}", path.display());
    println!();
    println!("To run a dry run, execute:");
    println!("  job-janitor run --config {}", path.display());
}

/// Export the JSON schema for the configuration file.
#[cfg(feature = "json-schema")]
fn run_schema_export(path: Option<PathBuf>) {
    let schema = JanitorConfig::json_schema_string();
    match path {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, schema) {
                eprintln!("Failed to write schema: {}", e);
                std::process::exit(1);
            }
            eprintln!("Schema written to {}", path.display());
        }
        None => println!("{}", schema),
    }
}
