//! Starts the single MetadataStore from the shared SurfStore config file,
//! opening RPC client handles to every configured BlockStore.

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use tracing::info;

use surfstore_block::Client as BlockClient;
use surfstore_core::Config;
use surfstore_metadata::{MetadataServer, MetadataStore};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// path to the shared SurfStore config file
    config: std::path::PathBuf,

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
    let block_clients: Vec<BlockClient> = config
        .block_stores
        .iter()
        .map(|ep| BlockClient::new(ep.addr()))
        .collect();

    let addr = config.metadata.addr();
    info!(
        "starting MetadataStore on {addr} with {} block store shard(s)",
        block_clients.len()
    );
    let server = MetadataServer::new(MetadataStore::new(block_clients));

    tokio::select! {
        result = server.serve(&addr) => result.context("MetadataStore server exited"),
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
            Ok(())
        }
    }
}
