use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "deviceiq")]
#[command(version, about = "Device coverage matrix and test plan builder")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a deviceiq project in the current directory
    Init,
    /// Upload a usage file and generate the device matrix
    Generate {
        /// Usage table (CSV) to upload
        file: PathBuf,

        /// Coverage threshold percentage (0-100)
        #[arg(short, long, default_value = "80")]
        threshold: f64,

        /// Group rows before ranking: device_model, os_version, os_major_version
        #[arg(long)]
        group_by: Option<String>,

        /// Aggregation service base URL (defaults to DEVICEIQ_SERVICE_URL)
        #[arg(long)]
        service_url: Option<String>,

        /// Rank and allocate locally instead of calling the service
        #[arg(long)]
        local: bool,
    },
    /// Upload a usage file and show the analytics aggregates
    Analytics {
        /// Usage table (CSV) to upload
        file: PathBuf,

        /// Group rows: device_model, os_version, os_major_version
        #[arg(long)]
        group_by: Option<String>,

        /// Aggregation service base URL (defaults to DEVICEIQ_SERVICE_URL)
        #[arg(long)]
        service_url: Option<String>,
    },
    /// Show the working matrix and its summary
    Matrix,
    /// Force a device into the matrix regardless of the threshold
    Pin { model: String, os: String },
    /// Remove a pin
    Unpin { model: String, os: String },
    /// Remove a device from the matrix regardless of the threshold
    Exclude { model: String, os: String },
    /// Remove an exclusion
    Unexclude { model: String, os: String },
    /// Inspect or edit a device's test flow assignment
    Flows {
        #[command(subcommand)]
        command: FlowsCommands,
    },
    /// View or edit the flow catalog
    Catalog {
        #[command(subcommand)]
        command: Option<CatalogCommands>,
    },
    /// Record or inspect execution statuses
    Status {
        #[command(subcommand)]
        command: StatusCommands,
    },
    /// Save, import, export, and load test plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Discard all session state
    Reset {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum FlowsCommands {
    /// Show the ordered flow list for a device
    Show { model: String, os: String },
    /// Enable or disable one flow (re-enabling appends at the end)
    Toggle {
        model: String,
        os: String,
        flow: String,
    },
    /// Move a flow from one position to another (1-based)
    Reorder {
        model: String,
        os: String,
        from: usize,
        to: usize,
    },
    /// Select all flows, or deselect all if everything is already selected
    SelectAll { model: String, os: String },
}

#[derive(Subcommand, Clone)]
pub enum CatalogCommands {
    /// Show the catalog
    Show,
    /// Append a new flow
    Add { name: String },
    /// Rename a flow, keeping its position
    Rename { old: String, new: String },
    /// Remove a flow (also strips it from current assignments)
    Remove { name: String },
}

#[derive(Subcommand, Clone)]
pub enum StatusCommands {
    /// Set the status for a (device, flow) pair
    Set {
        model: String,
        os: String,
        flow: String,
        /// One of: pending, running, passed, failed
        status: String,
    },
    /// Show all recorded statuses
    Show,
}

#[derive(Subcommand, Clone)]
pub enum PlanCommands {
    /// Snapshot the current working matrix as a named plan
    Save { name: String },
    /// Import a JSON plan artifact into the library
    Import { file: PathBuf },
    /// Export the current working matrix (stdout unless --output)
    Export {
        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List saved plans
    List,
    /// Show one saved plan
    Show { id: String },
    /// Mark a plan as selected
    Select { id: String },
    /// Re-serialize a saved plan as its JSON artifact
    Download {
        id: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a saved plan
    Delete { id: String },
    /// Replace the working matrix with a saved plan
    Load { id: String },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("deviceiq=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("deviceiq=warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Generate {
            file,
            threshold,
            group_by,
            service_url,
            local,
        } => {
            cmd::cmd_generate(
                &project_dir,
                file,
                *threshold,
                group_by.as_deref(),
                service_url.as_deref(),
                *local,
            )
            .await?
        }
        Commands::Analytics {
            file,
            group_by,
            service_url,
        } => cmd::cmd_analytics(file, group_by.as_deref(), service_url.as_deref()).await?,
        Commands::Matrix => cmd::cmd_matrix(&project_dir)?,
        Commands::Pin { model, os } => cmd::cmd_pin(&project_dir, model, os)?,
        Commands::Unpin { model, os } => cmd::cmd_unpin(&project_dir, model, os)?,
        Commands::Exclude { model, os } => cmd::cmd_exclude(&project_dir, model, os)?,
        Commands::Unexclude { model, os } => cmd::cmd_unexclude(&project_dir, model, os)?,
        Commands::Flows { command } => cmd::cmd_flows(&project_dir, command.clone())?,
        Commands::Catalog { command } => cmd::cmd_catalog(&project_dir, command.clone())?,
        Commands::Status { command } => match command {
            StatusCommands::Set {
                model,
                os,
                flow,
                status,
            } => cmd::cmd_status_set(&project_dir, model, os, flow, status)?,
            StatusCommands::Show => cmd::cmd_status_show(&project_dir)?,
        },
        Commands::Plan { command } => cmd::cmd_plan(&project_dir, command.clone())?,
        Commands::Reset { force } => cmd::cmd_reset(&project_dir, *force)?,
    }

    Ok(())
}
