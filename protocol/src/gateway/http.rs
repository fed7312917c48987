//! HTTP gateway adapter.
//!
//! Speaks the gateway's JSON-over-POST API:
//!
//! | Endpoint                 | Request                        | Response                      |
//! |--------------------------|--------------------------------|-------------------------------|
//! | `/status/gateway-status` | `{}`                           | `{"ledger_state":{"epoch":n}}`|
//! | `/transaction/submit`    | `{"notarized_transaction_hex"}`| `{"duplicate":bool}`          |
//! | `/transaction/status`    | `{"intent_hash"}`              | `{"status":"Pending"}`        |

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::types::{GatewayError, LedgerInfo, LedgerStatus, SubmitResponse, TransactionGateway};
use crate::transaction::header::Epoch;
use crate::transaction::intent::TransactionId;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Serialize)]
struct Empty {}

#[derive(Deserialize)]
struct GatewayStatusResponse {
    ledger_state: LedgerState,
}

#[derive(Deserialize)]
struct LedgerState {
    epoch: u64,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    notarized_transaction_hex: &'a str,
}

#[derive(Serialize)]
struct StatusRequest {
    intent_hash: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: LedgerStatus,
}

/// Gateway client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, GatewayError> {
        let url = self.url(path);
        debug!(url = %url, "gateway request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LedgerInfo for HttpGateway {
    async fn current_epoch(&self) -> Result<Epoch, GatewayError> {
        let response: GatewayStatusResponse = self.post("/status/gateway-status", &Empty {}).await?;
        Ok(Epoch(response.ledger_state.epoch))
    }
}

#[async_trait]
impl TransactionGateway for HttpGateway {
    async fn submit(&self, notarized_hex: &str) -> Result<SubmitResponse, GatewayError> {
        self.post(
            "/transaction/submit",
            &SubmitRequest {
                notarized_transaction_hex: notarized_hex,
            },
        )
        .await
    }

    async fn status(&self, tx_id: &TransactionId) -> Result<LedgerStatus, GatewayError> {
        let response: StatusResponse = self
            .post(
                "/transaction/status",
                &StatusRequest {
                    intent_hash: tx_id.to_hex(),
                },
            )
            .await?;
        Ok(response.status)
    }
}
