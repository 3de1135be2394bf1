use crate::app::runner::Scenario;
use crate::utils::table::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "crm-console")]
#[command(about = "CRUD demo for CRM accounts, contacts and cases")]
pub struct CliConfig {
    /// KEY=VALUE file loaded into the environment before connecting
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// TOML file with a [connection] section; overrides CRM_* variables
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Scenario::All)]
    pub scenario: Scenario,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Run against an in-process store instead of the CRM service
    #[arg(long)]
    pub offline: bool,

    /// Records requested per page on bulk reads
    #[arg(long)]
    pub page_size: Option<u32>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}
