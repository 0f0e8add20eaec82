//! HTTP routes: catalog, selection add/remove, reset, health, JSON 404.

use std::{sync::Arc, time::Duration};

use axum::{extract::{Path, State}, response::{IntoResponse, Response}, Json};
use axum::http::StatusCode;

use crate::model::{AddCardRequest, CardsResponse, ErrorBody, UserCardsResponse};
use crate::store::{CardStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CardStore>,
    pub catalog_delay: Duration,
}

impl AppState {
    pub fn new(store: CardStore) -> Self {
        Self { store: Arc::new(store), catalog_delay: Duration::ZERO }
    }

    pub fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.catalog_delay = delay;
        self
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = match &self {
            StoreError::UnknownCard(_) => StatusCode::NOT_FOUND,
            StoreError::Io { .. } | StoreError::Json { .. } => {
                tracing::error!(error = %self, "card store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { message: self.to_string() })).into_response()
    }
}

pub async fn healthz() -> &'static str { "ok" }

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody { message: "404 - Not Found".into() }))
}

pub async fn exodia_parts(State(state): State<AppState>) -> Result<Json<CardsResponse>, StoreError> {
    if !state.catalog_delay.is_zero() {
        tokio::time::sleep(state.catalog_delay).await;
    }
    let cards = state.store.catalog().await?;
    Ok(Json(CardsResponse { cards }))
}

pub async fn user_cards(State(state): State<AppState>) -> Result<Json<CardsResponse>, StoreError> {
    let cards = state.store.selection().await?;
    Ok(Json(CardsResponse { cards }))
}

pub async fn add_user_card(
    State(state): State<AppState>,
    Json(AddCardRequest { card_id }): Json<AddCardRequest>,
) -> Result<Json<UserCardsResponse>, StoreError> {
    let user_cards = state.store.add(&card_id).await?;
    Ok(Json(UserCardsResponse { user_cards }))
}

pub async fn remove_user_card(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserCardsResponse>, StoreError> {
    let user_cards = state.store.remove(&id).await?;
    Ok(Json(UserCardsResponse { user_cards }))
}

pub async fn reset_cards(State(state): State<AppState>) -> Result<Json<CardsResponse>, StoreError> {
    let cards = state.store.reset().await?;
    tracing::info!(catalog = cards.len(), "selection reset");
    Ok(Json(CardsResponse { cards }))
}
