mod cli;

use std::process;

use concerns::config::Config;
use concerns::notify::OutboxDispatcher;
use concerns::storage::Storage;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("CONCERNS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let root = config.storage_root().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let storage = match Storage::new(&root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };
    let outbox = OutboxDispatcher::new(config.outbox_path(&root));

    if let Err(e) = cli::run(&config, &storage, &outbox) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
