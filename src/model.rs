//! Card type and the JSON envelopes of the REST contract.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub title: String,
    pub image_url: String,
}

impl Card {
    pub fn new(id: impl Into<String>, title: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), image_url: image_url.into() }
    }
}

/// `{ cards: [...] }`, returned by the catalog, selection and reset endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardsResponse {
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// `{ userCards: [...] }`, returned by add and remove.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCardsResponse {
    pub user_cards: Vec<Card>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCardRequest {
    pub card_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// True if a card with `id` is in `cards`.
pub fn contains_id(cards: &[Card], id: &str) -> bool {
    cards.iter().any(|c| c.id == id)
}
