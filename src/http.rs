use crate::transport::Transport;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::error::Error;

/// Configuration for [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct HttpTransportConfig {
    /// Log ingest endpoint, usually of the form
    /// `https://{instance}.live.dynatrace.com/api/v2/logs/ingest`.
    pub ingest_url: String,
    /// API token sent as `Authorization: Api-Token <token>`.
    pub access_token: String,
}

/// Transport that POSTs each batch payload to the ingest endpoint.
///
/// One request per batch, `Content-Type: application/json; charset=utf-8`.
/// Retry, backoff and durable buffering are deliberately absent; a failed
/// send is surfaced to the caller and the batch is gone.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    ingest_url: String,
}

impl HttpTransport {
    /// Build a transport from the ingest URL and access token.
    ///
    /// **Returns**
    /// - `Err(..)` if the token is not a valid header value or the HTTP
    ///   client could not be constructed.
    pub fn new(config: HttpTransportConfig) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Api-Token {}", config.access_token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let client = Client::builder().default_headers(headers).build()?;
        Ok(HttpTransport {
            client,
            ingest_url: config.ingest_url,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: Vec<u8>) -> Result<(), Box<dyn Error + Send + Sync>> {
        let resp = self.client.post(&self.ingest_url).body(payload).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(format!("log ingest failed with status {}: {}", status, text).into())
        }
    }
}
