//! Protocol translation
//!
//! Accepts requests in the current envelope shape or one of the historical
//! legacy shapes (identified by a `reference` tag), normalizes them, and
//! shapes responses back into whatever wire format the original caller used.
//! Each context services only its allow-listed methods; anything else gets a
//! typed method-not-supported rejection so the remote correlator resolves
//! promptly instead of timing out.

use super::envelope::{ErrorPayload, Method, RequestEnvelope, ResponseEnvelope};
use crate::shared::error::{WalletError, WalletResult};
use crate::shared::types::{ClientInfo, PageMetadata};
use serde_json::{json, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// Which wire shape the original caller used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    Current,
    /// Legacy `reference`-tagged envelopes.
    V1,
}

/// The closed set of legacy request/response kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyTag {
    /// Renamed to `enable` in the current protocol.
    RequestAccess,
    GetAccounts,
    SignTransaction,
    SignMessage,
}

impl LegacyTag {
    pub const ALL: [LegacyTag; 4] = [
        LegacyTag::RequestAccess,
        LegacyTag::GetAccounts,
        LegacyTag::SignTransaction,
        LegacyTag::SignMessage,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            LegacyTag::RequestAccess => "requestAccess",
            LegacyTag::GetAccounts => "getAccounts",
            LegacyTag::SignTransaction => "signTransaction",
            LegacyTag::SignMessage => "signMessage",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.wire_name() == name)
    }

    /// The current-protocol method this tag maps to.
    pub fn method(self) -> Method {
        match self {
            LegacyTag::RequestAccess => Method::Enable,
            LegacyTag::GetAccounts => Method::GetAccounts,
            LegacyTag::SignTransaction => Method::SignTransaction,
            LegacyTag::SignMessage => Method::SignMessage,
        }
    }

    /// Inverse of [`LegacyTag::method`]; newer methods have no legacy form.
    pub fn for_method(method: Method) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.method() == method)
    }
}

/// The subset of methods a context is authorized to service.
#[derive(Debug, Clone)]
pub struct ContextCapabilities {
    allowed: HashSet<Method>,
}

impl ContextCapabilities {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            allowed: methods.into_iter().collect(),
        }
    }

    /// The privileged background/popup context services everything.
    pub fn privileged() -> Self {
        Self::new(Method::ALL)
    }

    pub fn allows(&self, method: Method) -> bool {
        self.allowed.contains(&method)
    }
}

/// A normalized request plus the protocol its caller spoke.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub envelope: RequestEnvelope,
    pub protocol: ProtocolVersion,
}

/// Outcome of inbound translation.
#[derive(Debug, Clone)]
pub enum Inbound {
    Request(InboundRequest),
    /// A ready-to-send rejection in the caller's own wire shape.
    Rejection(Value),
}

#[derive(Debug, Clone)]
pub struct ProtocolAdapter {
    capabilities: ContextCapabilities,
}

impl ProtocolAdapter {
    pub fn new(capabilities: ContextCapabilities) -> Self {
        Self { capabilities }
    }

    /// Normalize a raw inbound message into the current envelope.
    ///
    /// Returns `None` for traffic that is not addressed to this wallet (no
    /// method/reference field, or a reference tag outside the closed legacy
    /// set). The caller's id is an opaque string and is carried verbatim; its
    /// correlator matches the response by that exact id, so it is never
    /// rewritten. Caller identity is derived from the page metadata per
    /// request, never cached across origins.
    pub fn translate_inbound(&self, raw: &Value, page: &PageMetadata) -> Option<Inbound> {
        let obj = raw.as_object()?;
        if obj.contains_key("requestId") {
            // Responses are handled by translate_inbound_response.
            return None;
        }

        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let params = obj.get("params").cloned().filter(|p| !p.is_null());

        if let Some(method_name) = obj.get("method").and_then(Value::as_str) {
            let Some(method) = Method::from_wire(method_name) else {
                return Some(Inbound::Rejection(self.current_rejection(
                    id,
                    method_name,
                    &WalletError::method_not_supported(method_name),
                )));
            };
            if !self.capabilities.allows(method) {
                return Some(Inbound::Rejection(self.current_rejection(
                    id,
                    method_name,
                    &WalletError::method_not_supported(method_name),
                )));
            }
            return Some(Inbound::Request(InboundRequest {
                envelope: RequestEnvelope {
                    id,
                    method,
                    params,
                    client_info: ClientInfo::from_page(page),
                },
                protocol: ProtocolVersion::Current,
            }));
        }

        if let Some(reference) = obj.get("reference").and_then(Value::as_str) {
            // Unknown reference tags are another protocol's traffic, not ours.
            let tag = LegacyTag::from_wire(reference)?;
            let method = tag.method();
            if !self.capabilities.allows(method) {
                return Some(Inbound::Rejection(self.legacy_rejection(
                    id,
                    tag,
                    &WalletError::method_not_supported(reference),
                )));
            }
            return Some(Inbound::Request(InboundRequest {
                envelope: RequestEnvelope {
                    id,
                    method,
                    params,
                    client_info: ClientInfo::from_page(page),
                },
                protocol: ProtocolVersion::V1,
            }));
        }

        None
    }

    /// Normalize a raw inbound response, current or legacy shape.
    pub fn translate_inbound_response(&self, raw: &Value) -> Option<ResponseEnvelope> {
        let obj = raw.as_object()?;
        let request_id = obj
            .get("requestId")
            .and_then(Value::as_str)
            .map(str::to_string)?;

        if obj.contains_key("method") {
            return serde_json::from_value(raw.clone()).ok();
        }

        let reference = obj.get("reference").and_then(Value::as_str)?;
        let tag = LegacyTag::from_wire(reference)?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let result = obj.get("result").cloned().filter(|v| !v.is_null());
        let error = obj
            .get("error")
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value::<ErrorPayload>(v.clone()).ok());

        Some(ResponseEnvelope {
            id,
            request_id,
            method: tag.method(),
            result,
            error,
        })
    }

    /// Shape an outbound response back into the caller's wire format.
    ///
    /// For the legacy protocol the method rename is mapped back, and the
    /// `approved` field the rename dropped is reconstructed from the
    /// normalized result.
    pub fn translate_outbound(
        &self,
        response: &ResponseEnvelope,
        protocol: ProtocolVersion,
    ) -> WalletResult<Value> {
        match protocol {
            ProtocolVersion::Current => Ok(serde_json::to_value(response)?),
            ProtocolVersion::V1 => {
                let tag = LegacyTag::for_method(response.method).ok_or_else(|| {
                    WalletError::method_not_supported(format!(
                        "{} has no legacy wire form",
                        response.method.wire_name()
                    ))
                })?;

                let result = match &response.result {
                    Some(value) if tag == LegacyTag::RequestAccess => {
                        let mut merged = value.as_object().cloned().unwrap_or_default();
                        merged.insert(
                            "approved".to_string(),
                            Value::Bool(response.error.is_none()),
                        );
                        Value::Object(merged)
                    }
                    Some(value) => value.clone(),
                    None => Value::Null,
                };

                Ok(json!({
                    "id": &response.id,
                    "requestId": &response.request_id,
                    "reference": tag.wire_name(),
                    "result": result,
                    "error": &response.error,
                }))
            }
        }
    }

    fn current_rejection(&self, request_id: String, method_name: &str, error: &WalletError) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "requestId": request_id,
            "method": method_name,
            "result": null,
            "error": ErrorPayload::from_error(error),
        })
    }

    fn legacy_rejection(&self, request_id: String, tag: LegacyTag, error: &WalletError) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "requestId": request_id,
            "reference": tag.wire_name(),
            "result": null,
            "error": ErrorPayload::from_error(error),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::ERR_CODE_METHOD_NOT_SUPPORTED;

    fn page() -> PageMetadata {
        PageMetadata {
            origin: "https://dapp.example".to_string(),
            title: Some("Example DApp".to_string()),
            description: None,
            favicon: None,
        }
    }

    fn adapter() -> ProtocolAdapter {
        ProtocolAdapter::new(ContextCapabilities::privileged())
    }

    fn expect_request(inbound: Option<Inbound>) -> InboundRequest {
        match inbound {
            Some(Inbound::Request(request)) => request,
            other => panic!("expected a normalized request, got {:?}", other),
        }
    }

    fn expect_rejection(inbound: Option<Inbound>) -> Value {
        match inbound {
            Some(Inbound::Rejection(value)) => value,
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_current_request_normalized() {
        let id = Uuid::new_v4();
        let raw = json!({
            "id": id.to_string(),
            "method": "enable",
            "params": {"network": "mainnet"},
        });

        let request = expect_request(adapter().translate_inbound(&raw, &page()));
        assert_eq!(request.protocol, ProtocolVersion::Current);
        assert_eq!(request.envelope.id, id.to_string());
        assert_eq!(request.envelope.method, Method::Enable);
        assert_eq!(request.envelope.params, Some(json!({"network": "mainnet"})));
        assert_eq!(request.envelope.client_info.app_name, "Example DApp");
        assert_eq!(request.envelope.client_info.host, "dapp.example");
    }

    #[test]
    fn test_legacy_request_access_maps_to_enable() {
        let raw = json!({
            "id": Uuid::new_v4().to_string(),
            "reference": "requestAccess",
            "params": null,
        });

        let request = expect_request(adapter().translate_inbound(&raw, &page()));
        assert_eq!(request.protocol, ProtocolVersion::V1);
        assert_eq!(request.envelope.method, Method::Enable);
        assert_eq!(request.envelope.params, None);
    }

    #[test]
    fn test_request_without_id_gets_generated_one() {
        let raw = json!({"method": "getAccounts"});
        let request = expect_request(adapter().translate_inbound(&raw, &page()));
        assert_eq!(request.envelope.method, Method::GetAccounts);
        assert!(!request.envelope.id.is_empty());
    }

    #[test]
    fn test_caller_id_is_carried_verbatim() {
        // Ids are opaque strings chosen by the caller; a correlator on the
        // far side can only match responses if they echo the exact id.
        let raw = json!({"id": "caller-id-1", "method": "enable"});
        let request = expect_request(adapter().translate_inbound(&raw, &page()));
        assert_eq!(request.envelope.id, "caller-id-1");

        let response = ResponseEnvelope::success(&request.envelope, json!({"ok": true}));
        assert_eq!(response.request_id, "caller-id-1");

        // Rejections keep the caller's id too.
        let rejected = json!({"id": "seq-42", "method": "mintMoney"});
        let rejection = expect_rejection(adapter().translate_inbound(&rejected, &page()));
        assert_eq!(rejection["requestId"], json!("seq-42"));
    }

    #[test]
    fn test_foreign_traffic_is_ignored() {
        let adapter = adapter();
        assert!(adapter
            .translate_inbound(&json!({"hello": "world"}), &page())
            .is_none());
        assert!(adapter
            .translate_inbound(&json!("not an object"), &page())
            .is_none());
        // Unknown legacy reference: some other extension's protocol.
        assert!(adapter
            .translate_inbound(&json!({"id": "x", "reference": "otherWalletPing"}), &page())
            .is_none());
    }

    #[test]
    fn test_unknown_current_method_is_rejected_typed() {
        let id = Uuid::new_v4();
        let raw = json!({"id": id.to_string(), "method": "mintMoney"});

        let rejection = expect_rejection(adapter().translate_inbound(&raw, &page()));
        assert_eq!(rejection["requestId"], json!(id.to_string()));
        assert_eq!(rejection["error"]["code"], json!(ERR_CODE_METHOD_NOT_SUPPORTED));
        assert_eq!(rejection["result"], Value::Null);
    }

    #[test]
    fn test_allow_list_rejects_unserviced_method() {
        let restricted = ProtocolAdapter::new(ContextCapabilities::new([Method::Enable]));
        let raw = json!({
            "id": Uuid::new_v4().to_string(),
            "method": "signTransaction",
        });

        let rejection = expect_rejection(restricted.translate_inbound(&raw, &page()));
        assert_eq!(rejection["error"]["code"], json!(ERR_CODE_METHOD_NOT_SUPPORTED));

        // Same policy for the legacy shape, rejected in the legacy shape.
        let legacy_raw = json!({
            "id": Uuid::new_v4().to_string(),
            "reference": "signTransaction",
        });
        let rejection = expect_rejection(restricted.translate_inbound(&legacy_raw, &page()));
        assert_eq!(rejection["reference"], json!("signTransaction"));
        assert_eq!(rejection["error"]["code"], json!(ERR_CODE_METHOD_NOT_SUPPORTED));
    }

    #[test]
    fn test_legacy_mapping_is_bijective() {
        for tag in LegacyTag::ALL {
            assert_eq!(LegacyTag::for_method(tag.method()), Some(tag));
        }
        // Newer methods have no legacy form.
        assert_eq!(LegacyTag::for_method(Method::GetNetwork), None);
        assert_eq!(LegacyTag::for_method(Method::Disconnect), None);
    }

    #[test]
    fn test_legacy_roundtrip_reproduces_reference_tag() {
        let adapter = adapter();
        for tag in LegacyTag::ALL {
            let raw = json!({
                "id": Uuid::new_v4().to_string(),
                "reference": tag.wire_name(),
            });
            let request = expect_request(adapter.translate_inbound(&raw, &page()));
            assert_eq!(request.envelope.method, tag.method());

            let response =
                ResponseEnvelope::success(&request.envelope, json!({"ok": true}));
            let shaped = adapter
                .translate_outbound(&response, request.protocol)
                .unwrap();
            assert_eq!(shaped["reference"], json!(tag.wire_name()));
            assert_eq!(shaped["requestId"], json!(request.envelope.id.to_string()));
            assert_eq!(shaped["result"]["ok"], json!(true));
        }
    }

    #[test]
    fn test_legacy_request_access_response_reconstructs_approved() {
        let adapter = adapter();
        let raw = json!({
            "id": Uuid::new_v4().to_string(),
            "reference": "requestAccess",
        });
        let request = expect_request(adapter.translate_inbound(&raw, &page()));

        let response =
            ResponseEnvelope::success(&request.envelope, json!({"accounts": ["pk1"]}));
        let shaped = adapter.translate_outbound(&response, ProtocolVersion::V1).unwrap();
        assert_eq!(shaped["result"]["approved"], json!(true));
        assert_eq!(shaped["result"]["accounts"], json!(["pk1"]));
    }

    #[test]
    fn test_outbound_current_roundtrips_through_serde() {
        let adapter = adapter();
        let request = RequestEnvelope::new(
            Method::GetNetwork,
            None,
            ClientInfo::from_page(&page()),
        );
        let response = ResponseEnvelope::success(&request, json!({"network": "mainnet"}));

        let raw = adapter
            .translate_outbound(&response, ProtocolVersion::Current)
            .unwrap();
        let restored: ResponseEnvelope = serde_json::from_value(raw).unwrap();
        assert_eq!(restored, response);
    }

    #[test]
    fn test_outbound_legacy_without_legacy_form_errors() {
        let adapter = adapter();
        let request = RequestEnvelope::new(
            Method::GetNetwork,
            None,
            ClientInfo::from_page(&page()),
        );
        let response = ResponseEnvelope::success(&request, json!({}));

        let err = adapter
            .translate_outbound(&response, ProtocolVersion::V1)
            .unwrap_err();
        assert!(matches!(err, WalletError::MethodNotSupported(_)));
    }

    #[test]
    fn test_inbound_response_translation_both_shapes() {
        let adapter = adapter();
        let request = RequestEnvelope::new(
            Method::Enable,
            None,
            ClientInfo::from_page(&page()),
        );
        let response = ResponseEnvelope::success(&request, json!({"accounts": []}));

        // Current shape.
        let raw = serde_json::to_value(&response).unwrap();
        assert_eq!(adapter.translate_inbound_response(&raw), Some(response.clone()));

        // Legacy shape maps the reference back to the renamed method.
        let legacy = adapter
            .translate_outbound(&response, ProtocolVersion::V1)
            .unwrap();
        let normalized = adapter.translate_inbound_response(&legacy).unwrap();
        assert_eq!(normalized.method, Method::Enable);
        assert_eq!(normalized.request_id, request.id);
        assert_eq!(normalized.result.unwrap()["accounts"], json!([]));
    }

    #[test]
    fn test_requests_are_not_mistaken_for_responses() {
        let adapter = adapter();
        let raw = json!({"id": Uuid::new_v4().to_string(), "method": "enable"});
        assert_eq!(adapter.translate_inbound_response(&raw), None);
    }
}
