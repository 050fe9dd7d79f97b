use alloy::primitives::U256;
use async_trait::async_trait;
use paybridge_error::{ProviderError, ProviderResult};
use paybridge_traits::{Connection, EventStream, ProviderKind, TxHash, WalletProvider};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::chains::chain_id_hex;
use crate::erc20::{parse_address, transfer_calldata};
use crate::parse::{parse_accounts, parse_chain_id, parse_quantity, parse_tx_hash};
use crate::transport::Eip1193Transport;

/// An EIP-1193 wallet: an injected provider or a WalletConnect session.
///
/// Both kinds share every request; they differ only in how `connect` reads
/// the session back.
pub struct EvmWallet<T: Eip1193Transport> {
    kind: ProviderKind,
    transport: T,
    events: Option<Box<dyn EventStream>>,
}

impl<T: Eip1193Transport> EvmWallet<T> {
    /// Wraps an injected provider (MetaMask and compatible)
    pub fn injected(transport: T) -> Self {
        Self {
            kind: ProviderKind::MetaMask,
            transport,
            events: None,
        }
    }

    /// Wraps a WalletConnect provider
    pub fn wallet_connect(transport: T) -> Self {
        Self {
            kind: ProviderKind::WalletConnect,
            transport,
            events: None,
        }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn request_chain_id(&self) -> ProviderResult<u64> {
        let value = self.transport.request("eth_chainId", json!([])).await?;
        parse_chain_id(&value)
    }

    async fn send_transaction(&self, tx: Value) -> ProviderResult<TxHash> {
        let value = self
            .transport
            .request("eth_sendTransaction", Value::Array(vec![tx]))
            .await?;
        let hash = parse_tx_hash("eth_sendTransaction", &value)?;
        info!(%hash, "transaction submitted");
        Ok(TxHash::new(hash))
    }
}

#[async_trait(?Send)]
impl<T: Eip1193Transport> WalletProvider for EvmWallet<T> {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn connect(&mut self) -> ProviderResult<Connection> {
        let enabled = self.transport.enable().await?;
        self.events = self.transport.subscribe();

        match self.kind {
            ProviderKind::WalletConnect => {
                let mut accounts = self.transport.session_accounts();
                if accounts.is_empty() {
                    accounts = parse_accounts(&enabled)?;
                }
                let chain_id = match self.transport.session_chain_id() {
                    Some(id) => id,
                    None => self.request_chain_id().await?,
                };
                debug!(accounts = accounts.len(), chain_id, "walletconnect session enabled");
                Ok(Connection::with_accounts(accounts).with_chain_id(chain_id))
            }
            _ => {
                let accounts = parse_accounts(&enabled)?;
                debug!(accounts = accounts.len(), "injected provider enabled");
                Ok(Connection::with_accounts(accounts))
            }
        }
    }

    fn take_events(&mut self) -> Option<Box<dyn EventStream>> {
        self.events.take()
    }

    async fn disconnect(&mut self) -> ProviderResult<()> {
        self.events = None;
        self.transport.close().await
    }

    async fn address(&self) -> ProviderResult<Option<String>> {
        let value = self.transport.request("eth_accounts", json!([])).await?;
        Ok(parse_accounts(&value)?.into_iter().next())
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        self.request_chain_id().await
    }

    async fn balance(&self, address: &str) -> ProviderResult<U256> {
        let value = self
            .transport
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity("eth_getBalance", &value)
    }

    async fn send_native(&self, from: &str, to: &str, amount: U256) -> ProviderResult<TxHash> {
        parse_address(to)?;
        debug!(from, to, %amount, "sending native transfer");
        self.send_transaction(json!({
            "from": from,
            "to": to,
            "value": format!("0x{amount:x}"),
        }))
        .await
    }

    async fn send_token(
        &self,
        from: &str,
        contract: &str,
        to: &str,
        amount: U256,
    ) -> ProviderResult<TxHash> {
        parse_address(contract)?;
        let data = transfer_calldata(to, amount)?;
        debug!(from, contract, to, %amount, "sending ERC-20 transfer");
        self.send_transaction(json!({
            "from": from,
            "to": contract,
            "data": data,
        }))
        .await
    }

    async fn switch_chain(&self, chain_id: u64) -> ProviderResult<()> {
        info!(chain_id, "requesting chain switch");
        self.transport
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": chain_id_hex(chain_id) }]),
            )
            .await
            .map(|_| ())
            .map_err(|e| match e {
                ProviderError::UnrecognizedChain { message } => ProviderError::UnrecognizedChain {
                    message: format!("chain {chain_id}: {message}"),
                },
                other => other,
            })
    }
}
