use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "atna", version, about = "ATNA audit spool processor")]
struct Cli {
    /// Configuration file (YAML). Defaults to ./atna.yaml when present.
    #[arg(long, short, global = true, env = "ATNA_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "atna_audit=debug". RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble and send the audit message for one spool record.
    Process {
        /// Path to the spool record
        file: PathBuf,

        /// Event type tag, e.g. "connection-failed"
        #[arg(long = "event-type", short = 'e')]
        event_type: String,

        /// Delete the record after its message was sent
        #[arg(long, default_value_t = false)]
        delete: bool,
    },

    /// Process every record in a spool directory (<dir>/<event-type>/<record>).
    Drain {
        /// Spool directory. Defaults to spool.directory from configuration.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Delete records after their messages were sent
        #[arg(long, default_value_t = false)]
        delete: bool,
    },

    /// List known event types.
    EventTypes,

    /// Validate the configuration file.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::init_tracing(&cli.log_level);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Process {
            file,
            event_type,
            delete,
        } => commands::process::run_process(&config, &file, &event_type, delete).await?,

        Command::Drain { dir, delete } => {
            commands::drain::run_drain(&config, dir.as_deref(), delete).await?
        }

        Command::EventTypes => commands::event_types::run_event_types(&config)?,

        Command::Check => commands::check::run_check(&config)?,
    }

    Ok(())
}
