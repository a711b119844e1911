use clap::Parser;
use poly_odds::cli::{Cli, Commands};
use poly_odds::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to defaults when no file is present
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Note: could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::default()
        }
    };

    poly_odds::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  API: {}", config.api.base_url);
            println!(
                "  Endpoints: {} / {}",
                config.api.markets_path, config.api.history_path_template
            );
            println!("  Resample interval: {}s", config.resample.interval_seconds);
            println!("  Output dir: {}", config.output.dir.display());
            println!(
                "  Writers: csv={} svg={} html={}",
                config.output.csv, config.output.svg, config.output.html
            );
            println!(
                "  Retry: {} attempts, {}ms initial backoff",
                config.retry.max_attempts, config.retry.initial_backoff_ms
            );
        }
    }

    Ok(())
}
