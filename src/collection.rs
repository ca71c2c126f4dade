//! Ownership store accessor
//!
//! Backed by the `missing_cards` table: one row per `(user_id, card_id)`
//! pair meaning "this user does not own this card". Absence of a row means
//! owned, so toggling ownership is inserting or deleting a single row.

use reqwest::Client;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use crate::auth::Auth;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::rest::Table;

#[derive(Debug, Deserialize)]
struct CardIdRow {
    card_id: String,
}

#[derive(Debug, Deserialize)]
struct UserIdRow {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct UserCardRow {
    user_id: String,
    card_id: String,
}

/// CRUD over per-user missing-card records
pub struct CollectionStore {
    base_url: String,
    api_key: String,
    http_client: Client,
    auth: Auth,
    options: ClientOptions,
}

impl CollectionStore {
    /// Create a new ownership store accessor
    pub fn new(
        base_url: &str,
        api_key: &str,
        http_client: Client,
        auth: Auth,
        options: ClientOptions,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            http_client,
            auth,
            options,
        }
    }

    fn table(&self) -> Table {
        Table::new(
            &self.base_url,
            &self.api_key,
            "missing_cards",
            self.http_client.clone(),
        )
        .with_auth(&self.auth)
        .with_timeout(self.options.request_timeout)
    }

    /// Card IDs the user has marked missing, in backend response order
    pub async fn list_missing(&self, user_id: &str) -> Result<Vec<String>, Error> {
        self.auth.require_user_id()?;

        let rows: Vec<CardIdRow> = self
            .table()
            .select("card_id")
            .eq("user_id", user_id)
            .fetch()
            .await?;

        Ok(rows.into_iter().map(|row| row.card_id).collect())
    }

    /// Record that the user does not own this card. Marking a card missing
    /// twice is a no-op success, not an error.
    pub async fn mark_missing(&self, user_id: &str, card_id: &str) -> Result<(), Error> {
        self.auth.require_user_id()?;

        let row = serde_json::json!({ "user_id": user_id, "card_id": card_id });
        match self.table().ignore_duplicates().insert(&row).await {
            Ok(()) => Ok(()),
            Err(Error::Conflict(details)) => {
                log::debug!("duplicate missing-card row tolerated: {}", details);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Record that the user owns this card. Deleting a pair that does not
    /// exist is a no-op success.
    pub async fn mark_owned(&self, user_id: &str, card_id: &str) -> Result<(), Error> {
        self.auth.require_user_id()?;

        self.table()
            .eq("user_id", user_id)
            .eq("card_id", card_id)
            .delete()
            .await
    }

    /// Missing-card sets of every user except the given one
    pub async fn missing_by_user(
        &self,
        exclude_user_id: &str,
    ) -> Result<HashMap<String, HashSet<String>>, Error> {
        self.auth.require_user_id()?;

        let rows: Vec<UserCardRow> = self
            .table()
            .select("user_id,card_id")
            .neq("user_id", exclude_user_id)
            .fetch()
            .await?;

        let mut by_user: HashMap<String, HashSet<String>> = HashMap::new();
        for row in rows {
            by_user.entry(row.user_id).or_default().insert(row.card_id);
        }
        Ok(by_user)
    }

    /// Missing-card totals for the given users. Users with no records are
    /// absent from the result.
    pub async fn missing_counts(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, usize>, Error> {
        self.auth.require_user_id()?;

        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<UserIdRow> = self
            .table()
            .select("user_id")
            .in_list("user_id", user_ids)
            .fetch()
            .await?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in rows {
            *counts.entry(row.user_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

/// The caller-side view of one user's missing set for the current session.
///
/// Writes go to the store first and the local set only mutates after the
/// store confirms, so the set never runs ahead of the backend. Refreshes are
/// guarded by a generation counter: a fetch that was superseded by a newer
/// one is discarded instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct CollectionSession {
    user_id: String,
    order: Vec<String>,
    missing: HashSet<String>,
    generation: u64,
}

impl CollectionSession {
    /// Load the user's missing set from the store
    pub async fn load(store: &CollectionStore, user_id: &str) -> Result<Self, Error> {
        let order = store.list_missing(user_id).await?;
        let missing = order.iter().cloned().collect();
        Ok(Self {
            user_id: user_id.to_string(),
            order,
            missing,
            generation: 0,
        })
    }

    /// The user this session belongs to
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Whether the card is currently marked missing
    pub fn is_missing(&self, card_id: &str) -> bool {
        self.missing.contains(card_id)
    }

    /// Missing card IDs in a stable order (fetch order, toggles append)
    pub fn missing_ordered(&self) -> &[String] {
        &self.order
    }

    /// Missing card IDs as a set
    pub fn missing_set(&self) -> &HashSet<String> {
        &self.missing
    }

    /// Start a refresh cycle and get its generation token
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Apply a completed refresh. Returns false (and changes nothing) when a
    /// newer refresh has started since this one began.
    pub fn apply_refresh(&mut self, generation: u64, missing: Vec<String>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.missing = missing.iter().cloned().collect();
        self.order = missing;
        true
    }

    /// Flip a card between owned and missing. The store write completes
    /// before the local set changes; on error the set is left as it was.
    /// Returns the new missing state.
    pub async fn toggle(&mut self, store: &CollectionStore, card_id: &str) -> Result<bool, Error> {
        if self.missing.contains(card_id) {
            store.mark_owned(&self.user_id, card_id).await?;
            self.missing.remove(card_id);
            self.order.retain(|id| id != card_id);
            Ok(false)
        } else {
            store.mark_missing(&self.user_id, card_id).await?;
            self.missing.insert(card_id.to_string());
            self.order.push(card_id.to_string());
            Ok(true)
        }
    }
}
