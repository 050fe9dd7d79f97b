//! paybridge CLI
//!
//! Drives the connection manager against an HTTP EIP-1193 endpoint: a local
//! dev node or a desktop wallet exposing JSON-RPC (Frame by default). The
//! endpoint stands in for the injected wallet, so `connect` stores the `mm`
//! preference and later commands reconnect from it.

mod config;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::{CliConfig, Overrides};
use paybridge::{ConnectionManager, ConnectorConfig, FileStore, ProviderFactory};
use paybridge_error::ProviderResult;
use paybridge_evm::{EvmWallet, HttpTransport};
use paybridge_rpc::RpcConfig;
use paybridge_traits::{ProviderKind, WalletProvider};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "paybridge", version, about = "Wallet sessions and manifest payments")]
struct Cli {
    /// JSON-RPC endpoint holding the wallet's accounts
    #[arg(long, env = "PAYBRIDGE_RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Payment manifest (JSON object of code -> entry)
    #[arg(long, env = "PAYBRIDGE_MANIFEST", global = true)]
    manifest: Option<PathBuf>,

    /// Config file; defaults to <config dir>/paybridge/config.json
    #[arg(long, env = "PAYBRIDGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Where the provider preference is kept
    #[arg(long, env = "PAYBRIDGE_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect the endpoint's wallet and remember it
    Connect,
    /// Print the session
    Status,
    /// Print the native balance
    Balance,
    /// Check whether a payment code can be paid with the current wallet
    Check { code: String },
    /// Pay `amount` of `code` to `to`
    Pay {
        code: String,
        to: String,
        amount: String,
    },
    /// Forget the wallet
    Disconnect,
}

/// Only the injected kind exists outside the browser; it talks to the
/// configured endpoint.
struct HttpProviderFactory {
    rpc: RpcConfig,
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        kind: ProviderKind,
        _config: &ConnectorConfig,
    ) -> ProviderResult<Option<Box<dyn WalletProvider>>> {
        match kind {
            ProviderKind::MetaMask => {
                let transport = HttpTransport::new(self.rpc.clone())?;
                debug!(url = transport.url(), "using HTTP provider");
                Ok(Some(Box::new(EvmWallet::injected(transport))))
            }
            ProviderKind::WalletConnect | ProviderKind::TronLink => {
                debug!(%kind, "not available outside the browser");
                Ok(None)
            }
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_manager(config: &CliConfig) -> Result<ConnectionManager> {
    let factory = HttpProviderFactory { rpc: config.rpc()? };
    let store = FileStore::in_dir(config.state_dir()?);
    debug!(path = %store.path().display(), "preference store");
    Ok(ConnectionManager::new(factory, store, config.manifest()?).with_config(config.connector.clone()))
}

fn print_session(manager: &ConnectionManager) -> Result<()> {
    let session = manager.session();
    println!("{}", serde_json::to_string_pretty(session)?);
    println!("symbol: {}", manager.chain_symbol());
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?.apply(Overrides {
        rpc_url: cli.rpc_url,
        manifest: cli.manifest,
        state_dir: cli.state_dir,
    });
    let mut manager = build_manager(&config)?;

    match cli.command {
        Command::Connect => {
            if !manager
                .try_connect(ProviderKind::MetaMask)
                .await
                .context("wallet refused the connection")?
            {
                bail!("no wallet at {}", config.rpc_url);
            }
            info!("connected");
            println!("✅ Connected");
            print_session(&manager)?;
        }
        Command::Status => {
            manager.auto_connect().await;
            print_session(&manager)?;
        }
        Command::Balance => {
            manager.auto_connect().await;
            if !manager.session().connected {
                bail!("not connected; run `paybridge connect` first");
            }
            manager.sync_balance().await?;
            let balance = manager.session().balance.clone().unwrap_or_default();
            println!("{balance} {}", manager.chain_symbol());
        }
        Command::Check { code } => {
            if manager.test_pay(&code).is_none() {
                bail!("unknown payment code {code}");
            }
            manager.auto_connect().await;
            println!("{}", manager.is_network_valid(&code));
        }
        Command::Pay { code, to, amount } => {
            manager.auto_connect().await;
            let hash = manager.pay(&code, &to, &amount).await?;
            println!("✅ Sent {amount} {code}");
            println!("{hash}");
        }
        Command::Disconnect => {
            manager.disconnect().await;
            println!("Disconnected");
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pay() {
        let cli = Cli::try_parse_from([
            "paybridge",
            "--rpc-url",
            "http://127.0.0.1:8545",
            "pay",
            "USDT",
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "12.5",
        ])
        .unwrap();
        assert_eq!(cli.rpc_url.as_deref(), Some("http://127.0.0.1:8545"));
        match cli.command {
            Command::Pay { code, amount, .. } => {
                assert_eq!(code, "USDT");
                assert_eq!(amount, "12.5");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_factory_only_builds_injected() {
        let factory = HttpProviderFactory {
            rpc: RpcConfig::new("http://127.0.0.1:8545"),
        };
        let config = ConnectorConfig::default();
        assert!(factory
            .create(ProviderKind::MetaMask, &config)
            .unwrap()
            .is_some());
        assert!(factory
            .create(ProviderKind::TronLink, &config)
            .unwrap()
            .is_none());
        assert!(factory
            .create(ProviderKind::WalletConnect, &config)
            .unwrap()
            .is_none());
    }
}
