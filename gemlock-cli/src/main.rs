mod catalog;
mod handlers;
mod server;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use gemlock_core::expiry::ExpiryPolicy;
use gemlock_core::manager::LockConfig;
use gemlock_core::store::LockStore;
use gemlock_core::store_file::FileLockStore;
use gemlock_core::types::LockTable;

#[derive(Parser)]
#[command(
    name = "gemlock",
    about = "gemlock — edit-lock service for the gem balance editor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the edit-lock HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3200")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Storage backend: "memory" or "file:<path>"
        #[arg(long, default_value = "file:data/locks.json", env = "GEMLOCK_STORAGE")]
        storage: String,

        /// Root of the gem data tree (<data-dir>/<N>star/<gem>.json)
        #[arg(long, default_value = "data", env = "GEMLOCK_DATA_DIR")]
        data_dir: PathBuf,

        /// Lock lifetime in minutes
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(1..))]
        lock_minutes: i64,

        /// Treat a re-acquire by the current owner as a conflict instead
        /// of refreshing the lock
        #[arg(long)]
        no_self_refresh: bool,
    },

    /// Print the currently valid locks from a lock file, without mutating it
    Inspect {
        /// Path to the lock file
        #[arg(long, default_value = "data/locks.json")]
        file: PathBuf,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            storage,
            data_dir,
            lock_minutes,
            no_self_refresh,
        } => {
            let config = LockConfig {
                lock_duration: chrono::Duration::minutes(lock_minutes),
                allow_self_refresh: !no_self_refresh,
            };
            server::run(&host, port, &storage, data_dir, config).await;
        }
        Commands::Inspect { file } => {
            let store = FileLockStore::new(&file);
            let now = Utc::now();
            let valid: LockTable = store
                .load()
                .into_iter()
                .filter(|(_, record)| ExpiryPolicy::is_valid(record, now))
                .collect();

            println!("{}", serde_json::to_string_pretty(&valid).unwrap());
        }
        Commands::Version => {
            println!("gemlock {}", env!("CARGO_PKG_VERSION"));
            println!("Edit-lock service for the gem balance editor");
        }
    }
}
