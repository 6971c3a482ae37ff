//! Minimal EVM JSON-RPC client used to verify payments.
//!
//! Only two calls are needed: `eth_getTransactionReceipt` to learn whether a
//! transaction succeeded, and `eth_getTransactionByHash` to read who paid whom
//! and how much.

use std::time::Duration;

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::error::AppError;

/// Outcome of looking up a transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Mined with `status == 1`
    Success,
    /// Mined but failed, or no status field
    Reverted,
    /// Unknown hash or not mined yet
    NotFound,
}

/// The parts of a transaction relevant to payment matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    /// Sender, lowercase
    pub from: String,
    /// Recipient, lowercase; `None` for contract creation
    pub to: Option<String>,
    /// Transferred amount in wei
    pub value_wei: u128,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawReceipt {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    from: String,
    to: Option<String>,
    value: String,
}

/// JSON-RPC client bound to one node URL.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl ChainClient {
    /// Build a client with a per-request timeout.
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Rpc(format!("HTTP client error: {e}")))?;

        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Look up the receipt of `tx_hash`.
    pub async fn transaction_receipt(&self, tx_hash: &str) -> Result<ReceiptStatus, AppError> {
        let receipt: Option<RawReceipt> = self
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        Ok(match receipt {
            None => ReceiptStatus::NotFound,
            Some(receipt) => match receipt.status.as_deref().map(parse_hex_quantity) {
                Some(Some(1)) => ReceiptStatus::Success,
                _ => ReceiptStatus::Reverted,
            },
        })
    }

    /// Fetch sender, recipient and value of `tx_hash`.
    pub async fn transaction(&self, tx_hash: &str) -> Result<Option<ChainTransaction>, AppError> {
        let raw: Option<RawTransaction> = self
            .call("eth_getTransactionByHash", json!([tx_hash]))
            .await?;

        raw.map(|tx| {
            let value_wei = parse_hex_quantity(&tx.value).ok_or_else(|| {
                AppError::Rpc(format!("malformed transaction value: {}", tx.value))
            })?;
            Ok(ChainTransaction {
                from: tx.from.to_ascii_lowercase(),
                to: tx.to.map(|to| to.to_ascii_lowercase()),
                value_wei,
            })
        })
        .transpose()
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, AppError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        tracing::debug!(%method, url = %self.rpc_url, "JSON-RPC request");

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Rpc(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Rpc(format!("{method} returned HTTP {status}")));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::Rpc(format!("{method} returned malformed JSON: {e}")))?;

        if let Some(err) = body.error {
            return Err(AppError::Rpc(format!(
                "{method} failed with code {}: {}",
                err.code, err.message
            )));
        }

        Ok(body.result)
    }
}

/// Parse a `0x`-prefixed hex quantity such as `"0x1"` or `"0x38d7ea4c68000"`.
pub fn parse_hex_quantity(value: &str) -> Option<u128> {
    let digits = value.strip_prefix("0x")?;
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TX_HASH as HASH, fake_node};

    fn client(url: String) -> ChainClient {
        ChainClient::new(url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn hex_quantities() {
        assert_eq!(parse_hex_quantity("0x1"), Some(1));
        assert_eq!(parse_hex_quantity("0x0"), Some(0));
        assert_eq!(parse_hex_quantity("0x38d7ea4c68000"), Some(1_000_000_000_000_000));
        assert_eq!(parse_hex_quantity("0x"), None);
        assert_eq!(parse_hex_quantity("12"), None);
    }

    #[tokio::test]
    async fn successful_receipt() {
        let url = fake_node(|_| json!({"jsonrpc": "2.0", "id": 1, "result": {"status": "0x1"}})).await;
        assert_eq!(
            client(url).transaction_receipt(HASH).await.unwrap(),
            ReceiptStatus::Success
        );
    }

    #[tokio::test]
    async fn reverted_receipt() {
        let url = fake_node(|_| json!({"jsonrpc": "2.0", "id": 1, "result": {"status": "0x0"}})).await;
        assert_eq!(
            client(url).transaction_receipt(HASH).await.unwrap(),
            ReceiptStatus::Reverted
        );
    }

    #[tokio::test]
    async fn null_receipt_means_not_found() {
        let url = fake_node(|_| json!({"jsonrpc": "2.0", "id": 1, "result": null})).await;
        assert_eq!(
            client(url).transaction_receipt(HASH).await.unwrap(),
            ReceiptStatus::NotFound
        );
    }

    #[tokio::test]
    async fn rpc_error_object_is_surfaced() {
        let url = fake_node(|_| {
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "invalid argument"}})
        })
        .await;
        match client(url).transaction_receipt(HASH).await {
            Err(AppError::Rpc(msg)) => assert!(msg.contains("-32602")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_node_is_an_rpc_error() {
        let result = client("http://127.0.0.1:1/".to_string())
            .transaction_receipt(HASH)
            .await;
        assert!(matches!(result, Err(AppError::Rpc(_))));
    }

    #[tokio::test]
    async fn transaction_fields_are_normalized() {
        let url = fake_node(|method| {
            assert_eq!(method, "eth_getTransactionByHash");
            json!({"jsonrpc": "2.0", "id": 1, "result": {
                "from": "0x8BA1F109551BD432803012645AC136DDD64DBA72",
                "to": "0xAB5801A7D398351B8BE11C439E05C5B3259AEC9B",
                "value": "0x38d7ea4c68000"
            }})
        })
        .await;

        let tx = client(url).transaction(HASH).await.unwrap().unwrap();
        assert_eq!(tx.from, "0x8ba1f109551bd432803012645ac136ddd64dba72");
        assert_eq!(
            tx.to.as_deref(),
            Some("0xab5801a7d398351b8be11c439e05c5b3259aec9b")
        );
        assert_eq!(tx.value_wei, 1_000_000_000_000_000);
    }
}
