//! Request and response envelopes
//!
//! The normalized message unit exchanged between execution contexts, plus the
//! closed set of methods this wallet services and the wire error-code table.

use crate::shared::constants::{
    ERR_CODE_CANCELED, ERR_CODE_DECRYPTION, ERR_CODE_INVALID_PASSWORD, ERR_CODE_MALFORMED_DATA,
    ERR_CODE_METHOD_NOT_SUPPORTED, ERR_CODE_UNKNOWN,
};
use crate::shared::error::WalletError;
use crate::shared::types::ClientInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The closed set of request methods in the current protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "enable")]
    Enable,
    #[serde(rename = "getAccounts")]
    GetAccounts,
    #[serde(rename = "getNetwork")]
    GetNetwork,
    #[serde(rename = "signTransaction")]
    SignTransaction,
    #[serde(rename = "signMessage")]
    SignMessage,
    #[serde(rename = "disconnect")]
    Disconnect,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Enable,
        Method::GetAccounts,
        Method::GetNetwork,
        Method::SignTransaction,
        Method::SignMessage,
        Method::Disconnect,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Method::Enable => "enable",
            Method::GetAccounts => "getAccounts",
            Method::GetNetwork => "getNetwork",
            Method::SignTransaction => "signTransaction",
            Method::SignMessage => "signMessage",
            Method::Disconnect => "disconnect",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.wire_name() == name)
    }
}

/// A normalized inbound request.
///
/// The `id` is an opaque string chosen by the requester; responses echo it
/// verbatim in `request_id` so the requester's correlator can match them.
/// Requests originating in this crate use a v4 UUID string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub id: String,
    pub method: Method,
    pub params: Option<Value>,
    pub client_info: ClientInfo,
}

impl RequestEnvelope {
    /// Build an outbound request with a globally-unique id.
    pub fn new(method: Method, params: Option<Value>, client_info: ClientInfo) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            params,
            client_info,
        }
    }
}

/// A response correlated to exactly one request by `request_id`.
///
/// Exactly one of `result`/`error` is set by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub id: String,
    pub request_id: String,
    pub method: Method,
    pub result: Option<Value>,
    pub error: Option<ErrorPayload>,
}

impl ResponseEnvelope {
    pub fn success(request: &RequestEnvelope, result: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request_id: request.id.clone(),
            method: request.method,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(request: &RequestEnvelope, error: &WalletError) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request_id: request.id.clone(),
            method: request.method,
            result: None,
            error: Some(ErrorPayload::from_error(error)),
        }
    }
}

/// Typed wire error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub code: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorPayload {
    pub fn from_error(error: &WalletError) -> Self {
        let code = match error {
            WalletError::Canceled(_) => ERR_CODE_CANCELED,
            WalletError::InvalidPassword => ERR_CODE_INVALID_PASSWORD,
            WalletError::Decryption => ERR_CODE_DECRYPTION,
            WalletError::MalformedData(_) => ERR_CODE_MALFORMED_DATA,
            WalletError::MethodNotSupported(_) => ERR_CODE_METHOD_NOT_SUPPORTED,
            WalletError::Storage(_) | WalletError::Internal(_) | WalletError::Unknown(_) => {
                ERR_CODE_UNKNOWN
            }
        };
        Self {
            code,
            message: error.to_string(),
            data: None,
        }
    }

    pub fn into_error(self) -> WalletError {
        match self.code {
            ERR_CODE_CANCELED => WalletError::Canceled(self.message),
            ERR_CODE_INVALID_PASSWORD => WalletError::InvalidPassword,
            ERR_CODE_DECRYPTION => WalletError::Decryption,
            ERR_CODE_MALFORMED_DATA => WalletError::MalformedData(self.message),
            ERR_CODE_METHOD_NOT_SUPPORTED => WalletError::MethodNotSupported(self.message),
            _ => WalletError::Unknown(self.message),
        }
    }
}
