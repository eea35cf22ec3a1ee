//! Pokémon TCG API (`GET /cards?q=...`)

use super::CatalogTransport;
use crate::config::Config;
use crate::error::{CardScanError, Result};
use async_trait::async_trait;
use card_scan_common::CatalogCandidate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct CardsResponse {
    #[serde(default)]
    data: Vec<ApiCard>,
}

#[derive(Debug, Deserialize)]
struct ApiCard {
    id: String,
    name: String,
    #[serde(default)]
    number: String,
    set: Option<ApiSet>,
    images: Option<ApiImages>,
}

#[derive(Debug, Deserialize)]
struct ApiSet {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiImages {
    small: Option<String>,
    large: Option<String>,
}

impl From<ApiCard> for CatalogCandidate {
    fn from(card: ApiCard) -> Self {
        CatalogCandidate {
            id: card.id,
            name: card.name,
            set: card.set.map(|s| s.name).unwrap_or_default(),
            card_number: card.number,
            image_url: card.images.and_then(|i| i.small.or(i.large)),
        }
    }
}

/// Pokémon TCG API へのHTTPトランスポート
pub struct PokemonTcgTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

impl PokemonTcgTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CardScanError::Config(format!("HTTPクライアント作成失敗: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            page_size,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.catalog_url.clone(),
            config.get_catalog_api_key(),
            config.catalog_page_size,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn cards_url(&self) -> String {
        format!("{}/cards", self.base_url)
    }
}

fn parse_cards(body: &str) -> Result<Vec<CatalogCandidate>> {
    let response: CardsResponse = serde_json::from_str(body).map_err(|e| CardScanError::Search {
        status: None,
        message: format!("invalid response body: {}", e),
    })?;
    Ok(response.data.into_iter().map(CatalogCandidate::from).collect())
}

#[async_trait]
impl CatalogTransport for PokemonTcgTransport {
    async fn get(&self, q: &str) -> Result<Vec<CatalogCandidate>> {
        let page_size = self.page_size.to_string();
        let mut request = self
            .client
            .get(self.cards_url())
            .query(&[("q", q), ("pageSize", page_size.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|e| CardScanError::Search {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CardScanError::Search {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(CardScanError::Search {
                status: Some(status.as_u16()),
                message: body.chars().take(300).collect(),
            });
        }

        parse_cards(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "data": [
            {
                "id": "base1-58",
                "name": "Pikachu",
                "number": "58",
                "rarity": "Common",
                "set": { "id": "base1", "name": "Base" },
                "images": {
                    "small": "https://images.pokemontcg.io/base1/58.png",
                    "large": "https://images.pokemontcg.io/base1/58_hires.png"
                }
            },
            { "id": "promo-1", "name": "Pikachu" }
        ],
        "page": 1,
        "count": 2
    }"#;

    #[test]
    fn test_parse_cards() {
        let cards = parse_cards(SAMPLE).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, "base1-58");
        assert_eq!(cards[0].set, "Base");
        assert_eq!(cards[0].card_number, "58");
        assert_eq!(
            cards[0].image_url.as_deref(),
            Some("https://images.pokemontcg.io/base1/58.png")
        );
        assert_eq!(cards[1].set, "");
        assert_eq!(cards[1].image_url, None);
    }

    #[test]
    fn test_parse_cards_empty_data() {
        assert!(parse_cards(r#"{"data": []}"#).unwrap().is_empty());
        assert!(parse_cards("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_cards_invalid_body() {
        let result = parse_cards("<html>bad gateway</html>");
        assert!(matches!(result, Err(CardScanError::Search { status: None, .. })));
    }

    #[test]
    fn test_cards_url_trims_slash() {
        let transport =
            PokemonTcgTransport::new("https://api.pokemontcg.io/v2/", None, 10, Duration::from_secs(5))
                .unwrap();
        assert_eq!(transport.cards_url(), "https://api.pokemontcg.io/v2/cards");
    }
}
