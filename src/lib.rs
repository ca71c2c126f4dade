//! Pocket TCG collection tracker client
//!
//! A Rust client for a shared card-collection tracker: users sign up with a
//! friend code, mark catalog cards they are missing, and discover other
//! users who hold cards they need. Row storage and authentication live in a
//! hosted Supabase-style backend; the card catalog is a public JSON feed.

pub mod auth;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod error;
pub mod fetch;
pub mod friend_code;
pub mod matching;
pub mod profiles;
pub mod progress;
pub mod rest;

use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;

use crate::auth::{Auth, AuthResponse};
use crate::catalog::{CardCatalog, FeedSource};
use crate::collection::CollectionStore;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::matching::{find_trade_opportunities, MatchOptions, TradeOpportunity};
use crate::profiles::{CommunityProfile, ProfileDirectory};
use crate::progress::{pack_progress, PackProgress};

/// The main entry point for the tracker client
pub struct Tracker {
    /// The base URL for the backend project
    pub url: String,
    /// The anonymous API key for the backend project
    pub key: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Auth client for session management
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
    catalog: CardCatalog,
}

impl Tracker {
    /// Create a new tracker client
    ///
    /// # Arguments
    ///
    /// * `backend_url` - The base URL for your backend project
    /// * `backend_key` - The anonymous API key for your backend project
    ///
    /// # Example
    ///
    /// ```
    /// use pocket_tracker::Tracker;
    ///
    /// let tracker = Tracker::new("https://your-project.supabase.co", "your-anon-key");
    /// ```
    pub fn new(backend_url: &str, backend_key: &str) -> Self {
        Self::new_with_options(backend_url, backend_key, ClientOptions::default())
    }

    /// Create a new tracker client with custom options
    pub fn new_with_options(
        backend_url: &str,
        backend_key: &str,
        options: ClientOptions,
    ) -> Self {
        let http_client = Client::new();

        let auth = Auth::new(backend_url, backend_key, http_client.clone(), options.clone());
        let catalog = CardCatalog::new(Arc::new(FeedSource::new(
            http_client.clone(),
            &options.catalog_url,
            options.catalog_timeout,
        )));

        Self {
            url: backend_url.to_string(),
            key: backend_key.to_string(),
            http_client,
            auth,
            options,
            catalog,
        }
    }

    /// The auth client for session management
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The memoized card catalog
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    /// Accessor for the missing-card store
    pub fn collection(&self) -> CollectionStore {
        CollectionStore::new(
            &self.url,
            &self.key,
            self.http_client.clone(),
            self.auth.clone(),
            self.options.clone(),
        )
    }

    /// Accessor for the profile directory
    pub fn profiles(&self) -> ProfileDirectory {
        ProfileDirectory::new(
            &self.url,
            &self.key,
            self.http_client.clone(),
            self.auth.clone(),
            self.options.clone(),
        )
    }

    /// Sign up with email, password and a chosen friend code.
    ///
    /// The code is validated and checked for uniqueness before the account
    /// is created; afterwards the (possibly trigger-created) profile is
    /// claimed and updated with the chosen code.
    pub async fn sign_up_with_friend_code(
        &self,
        email: &str,
        password: &str,
        friend_code: &str,
    ) -> Result<AuthResponse, Error> {
        if !friend_code::is_valid_friend_code(friend_code) {
            return Err(Error::validation(
                "please enter a valid 16-digit friend code",
            ));
        }

        let profiles = self.profiles();
        if profiles.friend_code_taken(friend_code, None).await? {
            return Err(Error::DuplicateFriendCode);
        }

        let response = self.auth.sign_up(email, password).await?;

        profiles.ensure_profile(&response.user.id).await?;
        profiles
            .set_friend_code(&response.user.id, friend_code)
            .await?;

        Ok(response)
    }

    /// Sign in and make sure the user has a profile row
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, Error> {
        let response = self.auth.sign_in(email, password).await?;
        self.profiles().ensure_profile(&response.user.id).await?;
        Ok(response)
    }

    /// Compute trade opportunities for the signed-in user
    pub async fn trade_matches(
        &self,
        options: MatchOptions,
    ) -> Result<Vec<TradeOpportunity>, Error> {
        let user_id = self.auth.require_user_id()?;
        let catalog = self.catalog.get().await?;

        let collection = self.collection();
        let my_missing = collection.list_missing(&user_id).await?;
        let others_missing = collection.missing_by_user(&user_id).await?;
        let profiles = self.profiles().list_other_profiles(&user_id).await?;

        Ok(find_trade_opportunities(
            &catalog,
            &my_missing,
            &others_missing,
            &profiles,
            options,
        ))
    }

    /// Per-pack and overall collection progress for the signed-in user
    pub async fn collection_progress(&self) -> Result<Vec<PackProgress>, Error> {
        let user_id = self.auth.require_user_id()?;
        let catalog = self.catalog.get().await?;

        let missing: HashSet<String> = self
            .collection()
            .list_missing(&user_id)
            .await?
            .into_iter()
            .collect();

        Ok(pack_progress(&catalog, &missing))
    }

    /// Every other registered user with their missing-card count, newest
    /// first
    pub async fn community(&self) -> Result<Vec<CommunityProfile>, Error> {
        let user_id = self.auth.require_user_id()?;

        let profiles = self.profiles().list_other_profiles(&user_id).await?;
        let ids: Vec<String> = profiles.iter().map(|p| p.id.clone()).collect();
        let counts = self.collection().missing_counts(&ids).await?;

        Ok(profiles
            .into_iter()
            .map(|profile| CommunityProfile {
                missing_count: counts.get(&profile.id).copied().unwrap_or(0),
                profile,
            })
            .collect())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::catalog::{Card, CardCatalog};
    pub use crate::collection::{CollectionSession, CollectionStore};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::matching::{MatchOptions, TradeOpportunity};
    pub use crate::profiles::{ProfileDirectory, UserProfile};
    pub use crate::progress::PackProgress;
    pub use crate::Tracker;
}
