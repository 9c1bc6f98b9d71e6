// ABOUTME: CLI entrypoint for crosspost command
// ABOUTME: Handles error exit codes and command dispatch

use clap::Parser;
use crosspost::{
    checkpoint::CheckpointStore,
    cli::{Cli, Commands},
    config::Config,
    media::MediaResolver,
    publish::{DryRunPublisher, Publisher, XClient},
    source::RelayPool,
    sync::SyncEngine,
    Result,
};

fn main() {
    if let Err(e) = run() {
        eprintln!("crosspost: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    // A .env file is optional; real environment variables win either way.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match cli.command() {
        Commands::Sync => {
            let config = Config::load(&cli)?;

            let publisher: Box<dyn Publisher> = match &config.credentials {
                Some(creds) => {
                    println!("X API credentials found");
                    Box::new(XClient::new(creds.clone())?)
                }
                None => {
                    eprintln!("warning: X credentials missing, running in dry-run mode");
                    Box::new(DryRunPublisher)
                }
            };

            let source = RelayPool::new(config.relays.clone(), config.authors.clone())?;
            println!("Querying {} relay(s) for {} author(s)", config.relays.len(), config.authors.len());

            let fetcher = Box::new(MediaResolver::new()?);
            let store = CheckpointStore::new(config.state_file.clone());

            let mut engine = SyncEngine::new(source, publisher, fetcher, store);
            engine.run()?;
        }
        Commands::Status => {
            let store = CheckpointStore::new(cli.state_file.clone());
            let checkpoint = store.load();
            let when = chrono::DateTime::from_timestamp(checkpoint.last_synced_timestamp as i64, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| checkpoint.last_synced_timestamp.to_string());

            println!("checkpoint:  {}", store.path().display());
            println!("last synced: {}", when);
            println!("tracked ids: {}", checkpoint.synced_event_ids.len());
        }
    }

    Ok(())
}
