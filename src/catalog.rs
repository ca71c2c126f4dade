//! Card catalog accessor
//!
//! The catalog is a static JSON feed fetched once and held in memory for the
//! lifetime of the cache object. It is the universe of valid card IDs: every
//! ownership and matching computation is restricted to cards found here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::Error;

/// A catalog entry. Immutable; sourced entirely from the external feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub pack: String,
    #[serde(default)]
    pub health: String,
    #[serde(default)]
    pub image: String,
    /// The feed serves this as a string, not a boolean
    #[serde(default, rename = "fullart")]
    pub full_art: String,
    /// The feed serves this as a string, not a boolean
    #[serde(default)]
    pub ex: String,
    #[serde(default)]
    pub artist: String,
    /// Element/category of the card
    #[serde(default, rename = "type")]
    pub kind: String,
}

fn string_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("true")
}

impl Card {
    /// Whether this is a full-art printing
    pub fn is_full_art(&self) -> bool {
        string_flag(&self.full_art)
    }

    /// Whether this is an EX card
    pub fn is_ex(&self) -> bool {
        string_flag(&self.ex)
    }
}

/// Where catalog data comes from. Injected into [`CardCatalog`] so tests and
/// tools can substitute a fake feed.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_cards(&self) -> Result<Vec<Card>, Error>;
}

/// The production source: HTTP GET against the public feed URL
pub struct FeedSource {
    client: Client,
    url: String,
    timeout: Duration,
}

impl FeedSource {
    /// Create a feed source for the given URL
    pub fn new(client: Client, url: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl CatalogSource for FeedSource {
    async fn fetch_cards(&self) -> Result<Vec<Card>, Error> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(Error::catalog)?;

        if !response.status().is_success() {
            return Err(Error::catalog(format!(
                "feed returned status {}",
                response.status()
            )));
        }

        let cards = response.json::<Vec<Card>>().await.map_err(Error::catalog)?;
        Ok(cards)
    }
}

/// Memoizing catalog cache.
///
/// The first `get` fetches from the source; later calls return the cached
/// sequence without touching the network. `invalidate` clears the cache for
/// a manual refresh.
pub struct CardCatalog {
    source: Arc<dyn CatalogSource>,
    cached: RwLock<Option<Arc<Vec<Card>>>>,
}

impl CardCatalog {
    /// Create a catalog cache over the given source
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Get the card catalog, fetching it on first use
    pub async fn get(&self) -> Result<Arc<Vec<Card>>, Error> {
        if let Some(cards) = self.cached.read().unwrap().clone() {
            return Ok(cards);
        }

        let cards = match self.source.fetch_cards().await {
            Ok(cards) => Arc::new(cards),
            Err(err) => {
                log::warn!("catalog fetch failed: {}", err);
                return Err(err);
            }
        };

        let mut cached = self.cached.write().unwrap();
        *cached = Some(cards.clone());
        Ok(cards)
    }

    /// The cached catalog, if one has been fetched
    pub fn cached(&self) -> Option<Arc<Vec<Card>>> {
        self.cached.read().unwrap().clone()
    }

    /// Drop the cached catalog so the next `get` re-fetches
    pub fn invalidate(&self) {
        let mut cached = self.cached.write().unwrap();
        *cached = None;
    }
}

/// Search and dropdown filters from the browse view
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    /// Case-insensitive substring match on the card name
    pub search: Option<String>,
    pub pack: Option<String>,
    pub kind: Option<String>,
    pub rarity: Option<String>,
}

impl CardFilter {
    /// Whether a card passes every configured filter
    pub fn matches(&self, card: &Card) -> bool {
        if let Some(search) = &self.search {
            if !card.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(pack) = &self.pack {
            if &card.pack != pack {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if &card.kind != kind {
                return false;
            }
        }
        if let Some(rarity) = &self.rarity {
            if &card.rarity != rarity {
                return false;
            }
        }
        true
    }

    /// Apply the filter to a card list
    pub fn apply<'a>(&self, cards: &'a [Card]) -> Vec<&'a Card> {
        cards.iter().filter(|card| self.matches(card)).collect()
    }
}

fn distinct<F>(cards: &[Card], field: F) -> Vec<String>
where
    F: Fn(&Card) -> &str,
{
    let mut values: Vec<String> = Vec::new();
    for card in cards {
        let value = field(card);
        // The feed marks unparsed entries with the literal "Error"
        if value.is_empty() || value == "Error" {
            continue;
        }
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values
}

/// Distinct pack names, in catalog order
pub fn distinct_packs(cards: &[Card]) -> Vec<String> {
    distinct(cards, |card| &card.pack)
}

/// Distinct card types, in catalog order
pub fn distinct_kinds(cards: &[Card]) -> Vec<String> {
    distinct(cards, |card| &card.kind)
}

/// Distinct rarity symbols, sorted
pub fn distinct_rarities(cards: &[Card]) -> Vec<String> {
    let mut values = distinct(cards, |card| &card.rarity);
    values.sort();
    values
}
