//! Typed view of the window messages TronLink posts to the page.
//!
//! Every message has the shape `{ message: { action, data } }`. Only the
//! handful of actions that matter for connecting are decoded; the rest come
//! through as [`TronLinkMessage::Other`].

use serde::Deserialize;
use serde_json::Value;

/// Method name TronLink tunnels when the page asks for accounts
pub const REQUEST_ACCOUNTS_METHOD: &str = "tron_requestAccounts";

/// `data.data.name` of the reply that carries an authorized wallet
pub const WALLET_REPLY_NAME: &str = "Wallet";

/// `data.data.code` of a successful `tron_requestAccounts` reply
pub const REPLY_CODE_OK: i64 = 200;

/// A decoded TronLink window message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TronLinkMessage {
    /// `tunnel` carrying our own `tron_requestAccounts` request
    RequestAccounts {
        /// Request id the extension will answer with
        uuid: String,
    },
    /// `connect`: the user accepted the site
    Connect,
    /// `tabReply` named `Wallet`
    WalletAuth {
        /// `data.isAuth`
        authorized: bool,
        /// `data.data.address`
        address: Option<String>,
    },
    /// Any other `tabReply`, typically the answer to a request id
    Reply {
        /// `data.uuid`
        uuid: Option<String>,
        /// `data.data.code`
        code: Option<i64>,
        /// `data.data.message`
        message: Option<String>,
    },
    /// `setAccount`: the user switched accounts in the extension
    SetAccount {
        /// New selected account
        address: String,
    },
    /// Anything else; carries the action name
    Other(String),
}

#[derive(Deserialize)]
struct Envelope {
    message: Option<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    action: Option<String>,
    #[serde(default)]
    data: Value,
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
}

impl TronLinkMessage {
    /// Decodes `event.data` of a window message.
    ///
    /// Returns `None` for payloads that are not TronLink messages at all
    /// (no `message` object or no `action`).
    pub fn from_window_data(data: &Value) -> Option<Self> {
        let envelope = Envelope::deserialize(data).ok()?;
        let raw = envelope.message?;
        let action = raw.action?;
        let data = raw.data;

        let message = match action.as_str() {
            "tunnel" => {
                let is_request = str_at(&data, &["action"]) == Some("request");
                let method = str_at(&data, &["data", "method"]);
                match (is_request, method, str_at(&data, &["uuid"])) {
                    (true, Some(REQUEST_ACCOUNTS_METHOD), Some(uuid)) => {
                        TronLinkMessage::RequestAccounts {
                            uuid: uuid.to_string(),
                        }
                    }
                    _ => TronLinkMessage::Other(action.clone()),
                }
            }
            "connect" => TronLinkMessage::Connect,
            "tabReply" => match str_at(&data, &["data", "name"]) {
                Some(WALLET_REPLY_NAME) => TronLinkMessage::WalletAuth {
                    authorized: data.get("isAuth").and_then(Value::as_bool).unwrap_or(false),
                    address: str_at(&data, &["data", "address"]).map(str::to_string),
                },
                Some(name) => TronLinkMessage::Other(format!("tabReply:{name}")),
                None => TronLinkMessage::Reply {
                    uuid: str_at(&data, &["uuid"]).map(str::to_string),
                    code: data.get("data").and_then(|d| d.get("code")).and_then(Value::as_i64),
                    message: str_at(&data, &["data", "message"]).map(str::to_string),
                },
            },
            "setAccount" => match str_at(&data, &["address"]) {
                Some(address) => TronLinkMessage::SetAccount {
                    address: address.to_string(),
                },
                None => TronLinkMessage::Other(action.clone()),
            },
            _ => TronLinkMessage::Other(action.clone()),
        };
        Some(message)
    }

    /// Short name for logging
    pub fn action(&self) -> &str {
        match self {
            TronLinkMessage::RequestAccounts { .. } => "tunnel",
            TronLinkMessage::Connect => "connect",
            TronLinkMessage::WalletAuth { .. } | TronLinkMessage::Reply { .. } => "tabReply",
            TronLinkMessage::SetAccount { .. } => "setAccount",
            TronLinkMessage::Other(action) => action,
        }
    }
}
