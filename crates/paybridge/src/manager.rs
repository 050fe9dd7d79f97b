//! The connection manager: one session, one active provider.

use paybridge_error::ProviderResult;
use paybridge_evm::{chain_symbol, erc20::parse_address};
use paybridge_traits::units::{format_units, parse_units};
use paybridge_traits::{ChainType, EventStream, ProviderEvent, ProviderKind, TxHash, WalletProvider};
use paybridge_tron::validate_address;
use tracing::{debug, info, warn};

use crate::config::ConnectorConfig;
use crate::error::PayError;
use crate::factory::ProviderFactory;
use crate::manifest::{ManifestEntry, PaymentManifest};
use crate::session::{ConnectionStatus, Session};
use crate::storage::PreferenceStore;

/// Symbol reported for Tron sessions
pub const TRON_SYMBOL: &str = "TRX";

/// Events of one connection, tagged with the epoch they belong to.
///
/// Every connect and disconnect starts a new epoch; events carrying an older
/// epoch are dropped by [`ConnectionManager::apply_event`].
pub struct SessionEvents {
    epoch: u64,
    stream: Box<dyn EventStream>,
}

impl SessionEvents {
    /// Epoch these events belong to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Waits for the next provider event
    pub async fn next(&mut self) -> Option<ProviderEvent> {
        self.stream.next_event().await
    }
}

/// Owns the session and the active provider.
///
/// Connects are fire-and-forget: failures are logged and leave the session
/// as it was. Payments return a [`PayError`] naming the rejection.
pub struct ConnectionManager {
    config: ConnectorConfig,
    session: Session,
    provider: Option<Box<dyn WalletProvider>>,
    factory: Box<dyn ProviderFactory>,
    store: Box<dyn PreferenceStore>,
    manifest: PaymentManifest,
    epoch: u64,
}

impl ConnectionManager {
    /// Creates a disconnected manager with the default configuration
    pub fn new(
        factory: impl ProviderFactory + 'static,
        store: impl PreferenceStore + 'static,
        manifest: PaymentManifest,
    ) -> Self {
        Self {
            config: ConnectorConfig::default(),
            session: Session::default(),
            provider: None,
            factory: Box::new(factory),
            store: Box::new(store),
            manifest,
            epoch: 0,
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Current session snapshot
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Active configuration
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Payment manifest
    pub fn manifest(&self) -> &PaymentManifest {
        &self.manifest
    }

    /// Current session epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Kind of the active provider
    pub fn provider_kind(&self) -> Option<ProviderKind> {
        self.provider.as_ref().map(|p| p.kind())
    }

    // ------------------------------------------------------------------
    // Connecting
    // ------------------------------------------------------------------

    /// Connects the injected EVM provider
    pub async fn connect_metamask(&mut self) {
        self.connect(ProviderKind::MetaMask).await
    }

    /// Opens a WalletConnect session
    pub async fn connect_wallet_connect(&mut self) {
        self.connect(ProviderKind::WalletConnect).await
    }

    /// Starts the TronLink handshake; the session stays `Connecting` until
    /// the extension authorizes an account
    pub async fn connect_tron_link(&mut self) {
        self.connect(ProviderKind::TronLink).await
    }

    /// Connects `kind`, logging and swallowing any failure
    pub async fn connect(&mut self, kind: ProviderKind) {
        if let Err(e) = self.try_connect(kind).await {
            warn!(provider = %kind, error = %e, "connect failed");
        }
    }

    /// Connects `kind`; `Ok(false)` when the wallet is not available
    pub async fn try_connect(&mut self, kind: ProviderKind) -> ProviderResult<bool> {
        let Some(mut provider) = self.factory.create(kind, &self.config)? else {
            debug!(provider = %kind, "provider not available");
            return Ok(false);
        };

        info!(provider = %kind, "connecting");
        let prior_status = self.session.status;
        self.session.status = ConnectionStatus::Connecting;
        let connection = match provider.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                self.session.status = prior_status;
                return Err(e);
            }
        };

        self.teardown().await;
        self.session.provider = Some(kind);
        self.session.status = ConnectionStatus::Connecting;
        self.provider = Some(provider);

        match kind {
            ProviderKind::MetaMask => {
                self.save_preference(kind);
                self.handle_accounts_changed(connection.accounts).await;
            }
            ProviderKind::WalletConnect => {
                self.session.connected = true;
                self.session.status = ConnectionStatus::Connected;
                self.session.address = connection.primary_account().map(str::to_string);
                self.session.chain_id = connection.chain_id.unwrap_or_default();
                self.save_preference(kind);
                self.refresh_balance().await;
            }
            ProviderKind::TronLink => {
                debug!("[tronLink] waiting for authorization");
            }
        }
        Ok(true)
    }

    /// Reconnects the provider named by the stored preference.
    ///
    /// No stored value leaves the session untouched; unknown values are
    /// ignored.
    pub async fn auto_connect(&mut self) {
        let Some(value) = self.store.get(&self.config.storage_key) else {
            debug!("no stored provider");
            return;
        };
        match ProviderKind::from_storage_value(&value) {
            Some(kind) => {
                info!(provider = %kind, "auto-connecting");
                self.connect(kind).await;
            }
            None => warn!(value = %value, "ignoring unknown stored provider"),
        }
    }

    /// Ends the session, stops trusting its events and forgets the
    /// preference
    pub async fn disconnect(&mut self) {
        self.teardown().await;
        if let Err(e) = self.store.remove(&self.config.storage_key) {
            warn!(error = %e, "failed to remove stored provider");
        }
        info!("disconnected");
    }

    async fn teardown(&mut self) {
        if let Some(mut provider) = self.provider.take() {
            if let Err(e) = provider.disconnect().await {
                debug!(provider = %provider.kind(), error = %e, "provider disconnect failed");
            }
        }
        self.session.clear();
        self.epoch += 1;
    }

    fn save_preference(&self, kind: ProviderKind) {
        if let Err(e) = self.store.set(&self.config.storage_key, kind.storage_value()) {
            warn!(provider = %kind, error = %e, "failed to store provider");
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Takes the active provider's event stream
    pub fn take_events(&mut self) -> Option<SessionEvents> {
        let stream = self.provider.as_mut()?.take_events()?;
        Some(SessionEvents {
            epoch: self.epoch,
            stream,
        })
    }

    /// Waits for one event and applies it. Returns false once the stream
    /// has ended.
    pub async fn pump_event(&mut self, events: &mut SessionEvents) -> bool {
        match events.next().await {
            Some(event) => {
                self.apply_event(events.epoch(), event).await;
                true
            }
            None => false,
        }
    }

    /// Applies an event from the stream of `epoch`; returns whether it was
    /// applied
    pub async fn apply_event(&mut self, epoch: u64, event: ProviderEvent) -> bool {
        if epoch != self.epoch || self.provider.is_none() {
            debug!(?event, epoch, current = self.epoch, "dropping stale event");
            return false;
        }
        debug!(?event, "provider event");
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                self.handle_accounts_changed(accounts).await
            }
            ProviderEvent::ChainChanged(chain_id) => self.handle_chain_changed(chain_id).await,
            ProviderEvent::Connected => self.mark_connected(),
            ProviderEvent::Authorized { address } => {
                self.mark_connected();
                self.session.address = Some(address);
                self.session.balance = None;
                self.refresh_balance().await;
            }
            ProviderEvent::Disconnected => {
                info!("provider ended the session");
                self.disconnect().await;
            }
            ProviderEvent::Failed(reason) => {
                // the preference survives so the next auto_connect retries
                warn!(provider = ?self.session.provider, %reason, "provider gave up");
                self.teardown().await;
            }
        }
        true
    }

    fn mark_connected(&mut self) {
        self.session.connected = true;
        self.session.status = ConnectionStatus::Connected;
        if let Some(kind) = self.session.provider {
            self.save_preference(kind);
        }
    }

    async fn handle_accounts_changed(&mut self, accounts: Vec<String>) {
        let Some(address) = accounts.into_iter().next() else {
            debug!("ignoring empty accounts list");
            return;
        };
        self.session.address = Some(address);
        self.session.balance = None;

        if self.session.is_meta_mask() {
            self.session.connected = true;
            self.session.status = ConnectionStatus::Connected;
            if let Some(provider) = &self.provider {
                match provider.chain_id().await {
                    Ok(chain_id) => self.session.chain_id = chain_id,
                    Err(e) => warn!(error = %e, "failed to read chain id"),
                }
            }
        }
        self.refresh_balance().await;
    }

    async fn handle_chain_changed(&mut self, chain_id: u64) {
        self.session.chain_id = chain_id;
        self.session.balance = None;
        self.refresh_balance().await;
    }

    // ------------------------------------------------------------------
    // Balance
    // ------------------------------------------------------------------

    /// Reads the native balance of the session address, normalized by the
    /// chain's decimals. No-op without an address.
    pub async fn sync_balance(&mut self) -> ProviderResult<()> {
        let (Some(provider), Some(address)) = (&self.provider, &self.session.address) else {
            return Ok(());
        };
        let raw = provider.balance(address).await?;
        let balance = format_units(raw, provider.native_decimals())?;
        debug!(%address, %balance, "balance synced");
        self.session.balance = Some(balance);
        Ok(())
    }

    async fn refresh_balance(&mut self) {
        if let Err(e) = self.sync_balance().await {
            warn!(error = %e, "balance sync failed");
        }
    }

    // ------------------------------------------------------------------
    // Chains
    // ------------------------------------------------------------------

    /// Native symbol of the active chain
    pub fn chain_symbol(&self) -> &'static str {
        match self.session.chain_type() {
            Some(ChainType::Tron) => TRON_SYMBOL,
            _ => chain_symbol(self.session.chain_id),
        }
    }

    /// Asks the wallet to switch chains; no-op without a provider
    pub async fn switch_chain(&mut self, chain_id: u64) -> ProviderResult<()> {
        match &self.provider {
            Some(provider) => provider.switch_chain(chain_id).await,
            None => Ok(()),
        }
    }

    async fn ensure_chain(&mut self, expected: u64) -> Result<(), PayError> {
        let actual = self.session.chain_id;
        if actual == expected {
            return Ok(());
        }
        if !self.config.switch_chain_on_mismatch {
            return Err(PayError::ChainMismatch { expected, actual });
        }

        let now = {
            let provider = self.provider.as_ref().ok_or(PayError::NotConnected)?;
            info!(from = actual, to = expected, "switching chain before payment");
            if let Err(e) = provider.switch_chain(expected).await {
                warn!(error = %e, "chain switch failed");
            }
            provider.chain_id().await?
        };
        if now != actual {
            self.handle_chain_changed(now).await;
        }
        if now != expected {
            return Err(PayError::ChainMismatch {
                expected,
                actual: now,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Manifest entry for `code`
    pub fn test_pay(&self, code: &str) -> Option<&ManifestEntry> {
        self.manifest.get(code)
    }

    /// Whether `code` can be paid with the connected wallet
    pub fn is_network_valid(&self, code: &str) -> bool {
        self.manifest.is_network_valid(code, &self.session)
    }

    /// Pays `amount` (a human decimal string) of `code` to `to`.
    ///
    /// Resolves with the transaction hash as soon as the wallet returns it.
    pub async fn pay(&mut self, code: &str, to: &str, amount: &str) -> Result<TxHash, PayError> {
        let entry = self
            .manifest
            .get(code)
            .cloned()
            .ok_or_else(|| PayError::UnknownCode(code.to_string()))?;

        let active = self.session.provider;
        if !active.is_some_and(|kind| entry.accepts(kind)) {
            return Err(PayError::WrongProvider {
                required: entry.chain,
                active,
            });
        }

        let from = match &self.session.address {
            Some(address) if self.session.connected && self.provider.is_some() => address.clone(),
            _ => return Err(PayError::NotConnected),
        };

        validate_recipient(entry.chain, to)?;
        let value = parse_units(amount, entry.transfer_decimals())?;

        if entry.chain == ChainType::Evm {
            self.ensure_chain(entry.expected_chain_id()).await?;
        }

        let provider = self.provider.as_ref().ok_or(PayError::NotConnected)?;
        info!(code, to, amount, %value, "dispatching payment");
        let hash = match &entry.contract {
            None => provider.send_native(&from, to, value).await,
            Some(contract) => provider.send_token(&from, contract, to, value).await,
        }
        .map_err(|e| {
            warn!(code, error = %e, "payment failed");
            PayError::from(e)
        })?;
        info!(code, %hash, "payment submitted");
        Ok(hash)
    }
}

fn validate_recipient(chain: ChainType, to: &str) -> Result<(), PayError> {
    let checked = match chain {
        ChainType::Evm => parse_address(to).map(|_| ()),
        ChainType::Tron => validate_address(to),
    };
    checked.map_err(|e| PayError::InvalidRecipient(e.to_string()))
}
