//! Remote selection API: the `CardsApi` port and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::model::{AddCardRequest, Card, CardsResponse, ErrorBody, UserCardsResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid API base url: {0}")]
    InvalidBaseUrl(String),
    #[error("request to {url} failed: {source}")]
    Transport { url: String, #[source] source: reqwest::Error },
    #[error("{url} answered {status}: {message}")]
    Status { url: String, status: u16, message: String },
    #[error("unexpected response from {url}: {source}")]
    Decode { url: String, #[source] source: reqwest::Error },
}

/// The five calls the client makes against the backend.
#[async_trait]
pub trait CardsApi: Send + Sync {
    /// Full catalog.
    async fn catalog(&self) -> Result<Vec<Card>, ApiError>;
    /// Current server-side selection.
    async fn selection(&self) -> Result<Vec<Card>, ApiError>;
    /// Idempotent add; returns the selection after the change.
    async fn add(&self, card_id: &str) -> Result<Vec<Card>, ApiError>;
    /// Idempotent remove; returns the selection after the change.
    async fn remove(&self, card_id: &str) -> Result<Vec<Card>, ApiError>;
    /// Clears the selection and returns the catalog.
    async fn reset(&self) -> Result<Vec<Card>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpCardsApi {
    client: Client,
    base: Url,
}

impl HttpCardsApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ApiError::Transport { url: base.to_string(), source })?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Base was checked to be hierarchical in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &Url) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| ApiError::Transport { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text).map(|b| b.message).unwrap_or(text);
            return Err(ApiError::Status { url: url.to_string(), status: status.as_u16(), message });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url: url.to_string(), source })
    }
}

#[async_trait]
impl CardsApi for HttpCardsApi {
    async fn catalog(&self) -> Result<Vec<Card>, ApiError> {
        let url = self.endpoint(&["exodia-parts"]);
        let body: CardsResponse = self.send(self.client.get(url.clone()), &url).await?;
        Ok(body.cards)
    }

    async fn selection(&self) -> Result<Vec<Card>, ApiError> {
        let url = self.endpoint(&["user-cards"]);
        let body: CardsResponse = self.send(self.client.get(url.clone()), &url).await?;
        Ok(body.cards)
    }

    async fn add(&self, card_id: &str) -> Result<Vec<Card>, ApiError> {
        let url = self.endpoint(&["user-cards"]);
        let request = self.client.put(url.clone()).json(&AddCardRequest { card_id: card_id.to_string() });
        let body: UserCardsResponse = self.send(request, &url).await?;
        Ok(body.user_cards)
    }

    async fn remove(&self, card_id: &str) -> Result<Vec<Card>, ApiError> {
        let url = self.endpoint(&["user-cards", card_id]);
        let body: UserCardsResponse = self.send(self.client.delete(url.clone()), &url).await?;
        Ok(body.user_cards)
    }

    async fn reset(&self) -> Result<Vec<Card>, ApiError> {
        let url = self.endpoint(&["reset-cards"]);
        let body: CardsResponse = self.send(self.client.post(url.clone()), &url).await?;
        Ok(body.cards)
    }
}
