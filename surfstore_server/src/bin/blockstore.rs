//! Starts a single BlockStore instance from the shared SurfStore config
//! file.

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use tracing::info;

use surfstore_block::{BlockServer, MemoryBlockStore};
use surfstore_core::Config;

/// Starts BlockStore instance `index` (1-based) from the config's
/// `block<index>:` line.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// path to the shared SurfStore config file
    config: std::path::PathBuf,

    /// 1-based index of the `block<i>:` line this instance serves
    index: usize,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config).context("failed to load SurfStore config")?;
    let endpoint = config
        .block_stores
        .get(cli.index.checked_sub(1).context("index must be >= 1")?)
        .with_context(|| {
            format!(
                "config only defines {} block store(s), no block{}",
                config.n_blocks, cli.index
            )
        })?;

    let addr = endpoint.addr();
    info!("starting BlockStore {} on {addr}", cli.index);
    let server = BlockServer::new(MemoryBlockStore::new());

    tokio::select! {
        result = server.serve(&addr) => result.context("BlockStore server exited"),
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
            Ok(())
        }
    }
}
