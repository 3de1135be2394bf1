use clap::Parser;
use crm_console::config::load_env_file;
use crm_console::core::OrganizationService;
use crm_console::utils::error::ErrorSeverity;
use crm_console::utils::{logger, table::OutputFormat, validation::Validate};
use crm_console::{
    CliConfig, ConnectionConfig, CrmError, DemoRunner, InMemoryService, Result, Scenario,
    WebApiService,
};
use std::sync::Arc;

async fn run_demo<S: OrganizationService>(
    service: Arc<S>,
    page_size: u32,
    scenario: Scenario,
    format: OutputFormat,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut runner = DemoRunner::with_page_size(service, page_size, stdout.lock()).with_format(format);
    let report = runner.run(scenario).await?;

    tracing::info!(
        "✅ Demo finished: {} created, {} updated, {} deleted",
        report.created,
        report.updated,
        report.deleted
    );
    Ok(())
}

fn load_connection(config: &CliConfig) -> Result<ConnectionConfig> {
    let mut connection = match &config.config {
        Some(path) => ConnectionConfig::from_toml_file(path)?,
        None => ConnectionConfig::from_env()?,
    };
    if let Some(page_size) = config.page_size {
        connection.page_size = page_size;
    }
    connection.validate()?;
    Ok(connection)
}

async fn run(config: CliConfig) -> Result<()> {
    if config.offline {
        tracing::info!("🧠 Offline mode: using in-memory organization service");
        let page_size = config
            .page_size
            .unwrap_or(crm_console::core::gateway::DEFAULT_PAGE_SIZE);
        return run_demo(
            Arc::new(InMemoryService::new()),
            page_size,
            config.scenario,
            config.format,
        )
        .await;
    }

    match load_env_file(&config.env_file) {
        Ok(count) => tracing::debug!("Applied {} variables from {}", count, config.env_file.display()),
        Err(CrmError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No env file at {}", config.env_file.display());
        }
        Err(e) => return Err(e),
    }

    let connection = load_connection(&config)?;
    tracing::info!("🔌 Connecting to {}", connection.service_url);
    let service = Arc::new(WebApiService::new(&connection)?);
    run_demo(service, connection.page_size, config.scenario, config.format).await
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ Demo failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 4,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}
