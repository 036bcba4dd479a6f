use qg_pacer::Clock;
use qg_pacer::Jitter;
use qg_pacer::Pacer;
use qg_pacer::TOO_MANY_REQUESTS;
use qg_pacer::TokioClock;
use qg_pacer::UniformJitter;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::warn;

use crate::client::HttpClient;
use crate::errors::HttpError;
use crate::errors::Result;
use crate::headers::ResponseHeaders;

/// Replays allowed after a 429 before giving up
pub const DEFAULT_MAX_REJECTION_RETRIES: u32 = 3;

/// HTTP client that paces every request through a [`Pacer`]
///
/// Each call admits through the pacer, sends, then feeds the response headers
/// and status back. A 429 is slept through by the pacer and the request is
/// replayed; an exhausted quota in fail-fast mode comes back as
/// [`HttpError::Pacer`].
pub struct PacedClient<C = TokioClock, J = UniformJitter> {
    http: HttpClient,
    pacer: Pacer<C, J>,
    max_rejection_retries: u32,
}

impl<C: Clock, J: Jitter> PacedClient<C, J> {
    pub fn new(http: HttpClient, pacer: Pacer<C, J>) -> Self {
        Self { http, pacer, max_rejection_retries: DEFAULT_MAX_REJECTION_RETRIES }
    }

    pub fn with_max_rejection_retries(mut self, retries: u32) -> Self {
        self.max_rejection_retries = retries;
        self
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn pacer(&self) -> &Pacer<C, J> {
        &self.pacer
    }

    /// Create a GET request builder on the underlying client
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Send a request under pacing, replaying it after 429 rejections
    ///
    /// Any non-429 response is returned as is, success or not.
    pub async fn execute(&mut self, request: RequestBuilder) -> Result<Response> {
        let mut next = Some(request.build()?);
        let mut attempts: u32 = 0;

        loop {
            let current = next.take().ok_or(HttpError::UnreplayableRequest)?;
            // Streaming bodies cannot be cloned; that only matters if a replay is needed
            next = current.try_clone();

            self.pacer.admit().await;
            attempts += 1;
            debug!(url = %current.url(), attempt = attempts, "Sending paced request");
            let url = current.url().clone();

            let response = self.http.execute(current).await?;
            let status = response.status().as_u16();
            self.pacer.observe(&ResponseHeaders::new(response.headers()), status).await?;

            if status != TOO_MANY_REQUESTS {
                return Ok(response);
            }
            if attempts > self.max_rejection_retries {
                warn!(url = %url, attempts, "Giving up after repeated 429 responses");
                return Err(HttpError::Rejected { attempts });
            }
        }
    }

    /// GET `url` under pacing and deserialize a successful JSON body
    pub async fn get_json<T: DeserializeOwned>(&mut self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self.http.get(url).query(query);
        let response = self.execute(request).await?;
        let status = response.status();

        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(HttpError::ApiError { status: status.as_u16(), body: String::from_utf8_lossy(&bytes).into_owned() });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}
