use clap::Parser;
use zen_agent::cli::commands::{cmd_label, cmd_replay};
use zen_agent::cli::config::{Cli, Commands, build_agent_config, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Replay {
            events,
            site_id,
            collector,
            flush_interval_ms,
            storage_dir,
            url,
        } => {
            let agent_config = build_agent_config(
                &site_id,
                collector.as_deref(),
                flush_interval_ms,
                storage_dir.as_deref(),
                &config,
            );
            cmd_replay(&events, agent_config, url.as_deref())?;
        }
        Commands::Label { element } => {
            cmd_label(&element)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
