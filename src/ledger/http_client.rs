//! Ledger service adapter over HTTP.
//!
//! Implements both read paths the engine needs:
//! * `LedgerApi` for the REST snapshot endpoints;
//! * `PushChannelFactory` for the server-sent earnings stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::{SyncError, SyncResult};
use crate::ledger::api::LedgerApi;
use crate::ledger::types::{EscrowBalance, RentalSession, RentalsResponse};
use crate::streaming::channel::{PushChannel, PushChannelFactory};
use crate::streaming::sse::SseDecoder;

const ESCROW_PATH: &str = "/api/v1/billing/escrow";
const RENTALS_PATH: &str = "/api/v1/rentals";
const STREAM_PATH: &str = "/api/v1/billing/earnings/stream";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest single line or event accepted on the push stream.
const MAX_LINE_BYTES: usize = 256 * 1024;

pub struct HttpLedgerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLedgerClient {
    pub fn new(base_url: &str) -> SyncResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, address: &str) -> SyncResult<T> {
        let url = self.url(path);
        log::trace!("[HTTP] GET {} wallet={}", url, address);

        let resp = self
            .http
            .get(&url)
            .query(&[("wallet", address)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl LedgerApi for HttpLedgerClient {
    async fn fetch_balance(&self, address: &str) -> SyncResult<EscrowBalance> {
        self.get_json(ESCROW_PATH, address).await
    }

    async fn fetch_rentals(&self, address: &str) -> SyncResult<Vec<RentalSession>> {
        let resp: RentalsResponse = self.get_json(RENTALS_PATH, address).await?;
        Ok(resp.into_sessions())
    }
}

#[async_trait]
impl PushChannelFactory for HttpLedgerClient {
    async fn open(&self, address: &str) -> SyncResult<Box<dyn PushChannel>> {
        let url = self.url(STREAM_PATH);
        log::debug!("[HTTP] opening event stream {} wallet={}", url, address);

        let resp = self
            .http
            .get(&url)
            .query(&[("wallet", address)])
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| SyncError::Stream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Stream(format!("stream endpoint returned HTTP {status}")));
        }

        Ok(Box::new(SseChannel {
            body: Box::pin(resp.bytes_stream()),
            decoder: SseDecoder::new(MAX_LINE_BYTES),
            pending: VecDeque::new(),
        }))
    }
}

// =====================================================================
// SSE channel
// =====================================================================

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

struct SseChannel {
    body: ByteStream,
    decoder: SseDecoder,
    /// Payloads decoded from a chunk but not yet handed out.
    pending: VecDeque<String>,
}

#[async_trait]
impl PushChannel for SseChannel {
    async fn next_message(&mut self) -> Option<SyncResult<String>> {
        loop {
            if let Some(payload) = self.pending.pop_front() {
                return Some(Ok(payload));
            }

            match self.body.next().await {
                Some(Ok(chunk)) => match self.decoder.feed(&chunk) {
                    Ok(decoded) => self.pending.extend(decoded),
                    Err(e) => return Some(Err(e)),
                },
                Some(Err(e)) => return Some(Err(SyncError::Stream(e.to_string()))),
                None => return None,
            }
        }
    }
}
