//! Ledger transport - JSON-RPC 2.0 over HTTP
//!
//! The keeper never speaks to the chain directly; everything goes through
//! the `LedgerTransport` seam so tests can swap in a canned node. The real
//! transport is a reqwest client with a per-request timeout, so a stalled
//! node cannot hang a caller indefinitely.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rpc http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("rpc response carried no result")]
    EmptyResult,

    #[error("malformed hex quantity {0:?}")]
    Quantity(String),
}

/// One remote procedure call against the ledger node.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, TransportError>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC client for an HTTP ledger endpoint.
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }
}

#[async_trait]
impl LedgerTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response: RpcResponse = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response.result.ok_or(TransportError::EmptyResult)
    }
}

/// Decode a `0x`-prefixed hex quantity into a signed height. Values that do
/// not fit an i64 are rejected rather than truncated.
pub fn decode_quantity(raw: &str) -> Result<i64, TransportError> {
    let digits = raw
        .strip_prefix("0x")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| TransportError::Quantity(raw.to_string()))?;
    let value =
        u64::from_str_radix(digits, 16).map_err(|_| TransportError::Quantity(raw.to_string()))?;
    i64::try_from(value).map_err(|_| TransportError::Quantity(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_quantities() {
        assert_eq!(decode_quantity("0x0").unwrap(), 0);
        assert_eq!(decode_quantity("0x10").unwrap(), 16);
        assert_eq!(decode_quantity("0xde0b6b3").unwrap(), 0xde0b6b3);
    }

    #[test]
    fn rejects_malformed_quantities() {
        for raw in ["", "0x", "10", "0xzz", "0x-1"] {
            assert!(
                matches!(decode_quantity(raw), Err(TransportError::Quantity(_))),
                "expected rejection for {raw:?}"
            );
        }
    }

    #[test]
    fn rejects_quantities_wider_than_i64() {
        assert!(decode_quantity("0xffffffffffffffff").is_err());
        assert!(decode_quantity("0xffffffffffffffffff").is_err());
        assert_eq!(decode_quantity("0x7fffffffffffffff").unwrap(), i64::MAX);
    }
}
