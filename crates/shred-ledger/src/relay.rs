//! json-rpc relay client (write side)

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::NetworkError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const RECEIPT_ATTEMPTS: u32 = 15;
const RECEIPT_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub status: Option<String>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }
}

#[derive(Clone, Debug)]
pub struct RelayClient {
    url: String,
    http: reqwest::Client,
    receipt_attempts: u32,
    receipt_interval: Duration,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Result<Self, NetworkError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NetworkError::Unreachable(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
            receipt_attempts: RECEIPT_ATTEMPTS,
            receipt_interval: RECEIPT_INTERVAL,
        })
    }

    async fn call_value(&self, method: &str, params: Value) -> Result<Value, NetworkError> {
        debug!(method, "relay request");
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| NetworkError::Decode(e.to_string()))?;
        if let Some(err) = rpc.error {
            return Err(NetworkError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(rpc.result)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, NetworkError> {
        let value = self.call_value(method, params).await?;
        serde_json::from_value(value).map_err(|e| NetworkError::Decode(e.to_string()))
    }

    pub async fn nonce(&self, address: &str) -> Result<u64, NetworkError> {
        let hex: String = self
            .call("eth_getTransactionCount", json!([address, "latest"]))
            .await?;
        let n = parse_quantity(&hex)?;
        u64::try_from(n).map_err(|_| NetworkError::Decode(format!("nonce out of range: {}", hex)))
    }

    /// weibars
    pub async fn gas_price(&self) -> Result<u128, NetworkError> {
        let hex: String = self.call("eth_gasPrice", json!([])).await?;
        parse_quantity(&hex)
    }

    /// returns the transaction hash
    pub async fn send_raw(&self, raw: &[u8]) -> Result<String, NetworkError> {
        let encoded = format!("0x{}", hex::encode(raw));
        self.call("eth_sendRawTransaction", json!([encoded])).await
    }

    /// poll until mined; `None` if still pending after the last attempt
    pub async fn wait_for_receipt(&self, hash: &str) -> Result<Option<Receipt>, NetworkError> {
        for attempt in 0..self.receipt_attempts {
            let value = self
                .call_value("eth_getTransactionReceipt", json!([hash]))
                .await?;
            if !value.is_null() {
                let receipt = serde_json::from_value(value)
                    .map_err(|e| NetworkError::Decode(e.to_string()))?;
                return Ok(Some(receipt));
            }
            debug!(hash, attempt, "receipt pending");
            tokio::time::sleep(self.receipt_interval).await;
        }
        Ok(None)
    }
}

/// `0x`-prefixed hex quantity
pub fn parse_quantity(value: &str) -> Result<u128, NetworkError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| NetworkError::Decode(format!("not a hex quantity: {}", value)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| NetworkError::Decode(format!("not a hex quantity: {}", value)))
}
