use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use tracing::debug;

use surfstore_client::session::{DownloadOutcome, Session, UploadOutcome};
use surfstore_core::Config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// path to the shared SurfStore config file (`B:`/`metadata:`/`block<i>:` lines)
    config: PathBuf,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a local file, chunking and deduplicating its blocks
    Upload { localpath: PathBuf },
    /// Download a remote file into a local directory
    Download {
        remotename: String,
        localdir: PathBuf,
    },
    /// Delete a remote file
    Delete { remotename: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config).context("failed to load SurfStore config")?;
    debug!("loaded config with {} block stores", config.n_blocks);
    let session = Session::from_config(&config);

    match cli.cmd {
        Commands::Upload { localpath } => match session.upload(&localpath).await? {
            UploadOutcome::Ok => println!("OK"),
            UploadOutcome::LocalFileNotFound => println!("Not Found"),
        },
        Commands::Download {
            remotename,
            localdir,
        } => match session.download(&remotename, &localdir).await? {
            DownloadOutcome::Ok => println!("OK"),
            DownloadOutcome::RemoteNotFound => println!("Not Found"),
        },
        Commands::Delete { remotename } => {
            session.delete(&remotename).await?;
            println!("OK");
        }
    }

    Ok(())
}
