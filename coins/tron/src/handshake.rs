//! The TronLink connect handshake as an explicit state machine.
//!
//! ```text
//! AwaitingExtension --extension_found--> AwaitingAccountAuth --reply/auth--> Authorized
//! ```
//!
//! The machine never performs I/O. Each message yields at most one
//! [`HandshakeEffect`] that the wallet turns into a provider event.

use crate::protocol::{TronLinkMessage, REPLY_CODE_OK};

/// Where the handshake stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Polling for `window.tronLink`
    AwaitingExtension,
    /// Listener installed and accounts requested
    AwaitingAccountAuth {
        /// Id of our `tron_requestAccounts` request, once the tunnel echoed it
        request_id: Option<String>,
    },
    /// An account has been authorized
    Authorized {
        /// The authorized account (`None` until the default address is resolved)
        address: Option<String>,
    },
}

/// What a message means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEffect {
    /// The site was accepted; the account may still be unknown
    Connected,
    /// The wallet authorized this account
    Authorized {
        /// Authorized account
        address: String,
    },
    /// Our request was approved; the account is the extension's default address
    AuthorizedDefault,
    /// The user switched accounts
    AccountChanged {
        /// New account
        address: String,
    },
}

/// TronLink handshake state.
#[derive(Debug, Clone)]
pub struct Handshake {
    state: HandshakeState,
    connected: bool,
    request_id: Option<String>,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    /// Starts waiting for the extension
    pub fn new() -> Self {
        Self {
            state: HandshakeState::AwaitingExtension,
            connected: false,
            request_id: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// True once a `connect` or an authorization was seen
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The recorded `tron_requestAccounts` id
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// The extension appeared and the listener is installed
    pub fn extension_found(&mut self) {
        if self.state == HandshakeState::AwaitingExtension {
            self.state = HandshakeState::AwaitingAccountAuth { request_id: None };
        }
    }

    /// Records the default address once it has been resolved
    pub fn resolve_default_address(&mut self, address: &str) {
        self.state = HandshakeState::Authorized {
            address: Some(address.to_string()),
        };
    }

    /// Advances the machine with one message.
    pub fn on_message(&mut self, message: &TronLinkMessage) -> Option<HandshakeEffect> {
        if self.state == HandshakeState::AwaitingExtension {
            return None;
        }

        match message {
            TronLinkMessage::RequestAccounts { uuid } => {
                if self.request_id.is_some() || self.connected {
                    return None;
                }
                self.request_id = Some(uuid.clone());
                if let HandshakeState::AwaitingAccountAuth { request_id } = &mut self.state {
                    *request_id = Some(uuid.clone());
                }
                None
            }
            TronLinkMessage::Connect => {
                self.connected = true;
                Some(HandshakeEffect::Connected)
            }
            TronLinkMessage::WalletAuth {
                authorized: true,
                address: Some(address),
            } => {
                self.authorize(Some(address.clone()));
                Some(HandshakeEffect::Authorized {
                    address: address.clone(),
                })
            }
            TronLinkMessage::WalletAuth { .. } => None,
            TronLinkMessage::Reply { uuid, code, .. } => {
                let answers_ours = uuid.is_some() && uuid.as_deref() == self.request_id.as_deref();
                if answers_ours && *code == Some(REPLY_CODE_OK) {
                    self.authorize(None);
                    Some(HandshakeEffect::AuthorizedDefault)
                } else {
                    None
                }
            }
            TronLinkMessage::SetAccount { address } => {
                if let HandshakeState::Authorized { address: current } = &mut self.state {
                    *current = Some(address.clone());
                }
                Some(HandshakeEffect::AccountChanged {
                    address: address.clone(),
                })
            }
            TronLinkMessage::Other(_) => None,
        }
    }

    fn authorize(&mut self, address: Option<String>) {
        self.connected = true;
        self.state = HandshakeState::Authorized { address };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Handshake {
        let mut hs = Handshake::new();
        hs.extension_found();
        hs
    }

    fn request(uuid: &str) -> TronLinkMessage {
        TronLinkMessage::RequestAccounts { uuid: uuid.into() }
    }

    fn reply(uuid: &str, code: i64) -> TronLinkMessage {
        TronLinkMessage::Reply {
            uuid: Some(uuid.into()),
            code: Some(code),
            message: None,
        }
    }

    #[test]
    fn test_initial_state() {
        let hs = Handshake::new();
        assert_eq!(hs.state(), &HandshakeState::AwaitingExtension);
        assert!(!hs.is_connected());
    }

    #[test]
    fn test_messages_ignored_before_extension() {
        let mut hs = Handshake::new();
        assert_eq!(hs.on_message(&TronLinkMessage::Connect), None);
        assert!(!hs.is_connected());
    }

    #[test]
    fn test_request_reply_authorizes_default_address() {
        let mut hs = started();
        assert_eq!(hs.on_message(&request("u1")), None);
        assert_eq!(
            hs.state(),
            &HandshakeState::AwaitingAccountAuth {
                request_id: Some("u1".into())
            }
        );

        assert_eq!(hs.on_message(&reply("u1", 200)), Some(HandshakeEffect::AuthorizedDefault));
        assert!(hs.is_connected());

        hs.resolve_default_address("TDefault");
        assert_eq!(
            hs.state(),
            &HandshakeState::Authorized {
                address: Some("TDefault".into())
            }
        );
    }

    #[test]
    fn test_first_request_id_wins() {
        let mut hs = started();
        hs.on_message(&request("u1"));
        hs.on_message(&request("u2"));
        assert_eq!(hs.request_id(), Some("u1"));
        assert_eq!(hs.on_message(&reply("u2", 200)), None);
    }

    #[test]
    fn test_request_ignored_once_connected() {
        let mut hs = started();
        hs.on_message(&TronLinkMessage::Connect);
        hs.on_message(&request("late"));
        assert_eq!(hs.request_id(), None);
    }

    #[test]
    fn test_rejected_reply() {
        let mut hs = started();
        hs.on_message(&request("u1"));
        assert_eq!(hs.on_message(&reply("u1", 4001)), None);
        assert!(!hs.is_connected());
    }

    #[test]
    fn test_reply_without_pending_request() {
        let mut hs = started();
        let msg = TronLinkMessage::Reply {
            uuid: None,
            code: Some(200),
            message: None,
        };
        assert_eq!(hs.on_message(&msg), None);
    }

    #[test]
    fn test_wallet_auth() {
        let mut hs = started();
        let msg = TronLinkMessage::WalletAuth {
            authorized: true,
            address: Some("TAuth".into()),
        };
        assert_eq!(
            hs.on_message(&msg),
            Some(HandshakeEffect::Authorized {
                address: "TAuth".into()
            })
        );
        assert!(hs.is_connected());

        let unauthorized = TronLinkMessage::WalletAuth {
            authorized: false,
            address: Some("TOther".into()),
        };
        assert_eq!(hs.on_message(&unauthorized), None);
    }

    #[test]
    fn test_connect_then_set_account() {
        let mut hs = started();
        assert_eq!(hs.on_message(&TronLinkMessage::Connect), Some(HandshakeEffect::Connected));
        assert_eq!(
            hs.on_message(&TronLinkMessage::SetAccount {
                address: "TNext".into()
            }),
            Some(HandshakeEffect::AccountChanged {
                address: "TNext".into()
            })
        );
    }
}
