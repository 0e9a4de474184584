use clap::Parser;
use content_actions::adapters::terminal::{drive, TerminalSurface};
use content_actions::config::{CliConfig, Command};
use content_actions::utils::{logger, validation::Validate};
use content_actions::{Content, ContentConfig, ContentEnv, HttpTransport, MemoryContainer, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting content-actions CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match run(cli).await {
        Ok(summary) => println!("✅ {}", summary),
        Err(e) => {
            tracing::error!("❌ {} (Category: {:?})", e, e.category());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: CliConfig) -> Result<String> {
    cli.validate()?;

    let mut config = match &cli.config {
        Some(path) => ContentConfig::from_file(path)?,
        None => ContentConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.transport.base_url = Some(base_url.clone());
    }
    config.validate()?;
    cli.command
        .target()
        .validate_endpoints(config.transport.base_url.is_some())?;

    let transport = Arc::new(HttpTransport::from_config(&config.transport)?);
    let surface = Arc::new(TerminalSurface::new());
    let env = ContentEnv::new(transport, surface).with_options(config.content_options());

    let container = cli
        .command
        .target()
        .data_attributes()
        .into_iter()
        .fold(MemoryContainer::new(), |container, (name, value)| {
            container.with_data(name, value)
        });
    let mut content = Content::from_container(container.clone(), env.clone());
    tracing::debug!("Allowed actions: {}", content.actions());

    let summary = match &cli.command {
        Command::Create(_) => {
            let outcome = drive(content.create(None), &env).await?;
            format!("create finished: {:?}", outcome)
        }
        Command::Edit(_) => {
            let outcome = drive(content.edit(None), &env).await?;
            format!("edit finished: {:?}", outcome)
        }
        Command::Delete(_) => {
            let outcome = drive(content.delete(), &env).await?;
            format!("delete finished: {:?}", outcome)
        }
    };

    let rendered = container.content();
    if !rendered.is_empty() {
        println!("{}", rendered);
    }
    if !container.is_attached() {
        println!("🗑️  Content removed");
    }

    Ok(summary)
}
