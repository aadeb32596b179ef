use clap::{Parser, Subcommand};
use mediatr_cli::{
    bootstrap, error::CliResult, load_config, products::commands::CreateProduct, run_demo,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON mediator config file
    #[arg(short, long, env = "MEDIATR_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a product, read it back and print it as JSON
    Demo(DemoArgs),

    /// Print the effective mediator configuration
    Config,
}

#[derive(Parser)]
struct DemoArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long)]
    price: f64,
}

async fn run(cli: &Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");

    match &cli.command {
        Commands::Demo(args) => {
            let (mediator, products) = bootstrap(config)?;
            let command = CreateProduct {
                name: args.name.clone(),
                description: args.description.clone(),
                price: args.price,
            };
            let report = run_demo(&mediator, &products, command).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
