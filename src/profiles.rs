//! Profile directory accessor
//!
//! Backed by the `user_profiles` table. One row per registered user,
//! created at signup or lazily on first visit, mutated only to set or
//! correct the username and friend code.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::auth::Auth;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::friend_code::{generate_friend_code, is_valid_friend_code};
use crate::rest::Table;

/// A user's public profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "friend_code")]
    pub friend_code: String,
    #[serde(
        default,
        rename = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// A profile together with its missing-card count, for the community view
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityProfile {
    pub profile: UserProfile,
    pub missing_count: usize,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    #[allow(dead_code)]
    id: String,
}

/// Placeholder username for lazily created profiles
fn placeholder_username(user_id: &str) -> String {
    let prefix: String = user_id
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .take(8)
        .collect();
    format!("user_{}", prefix)
}

/// CRUD over user profile records
pub struct ProfileDirectory {
    base_url: String,
    api_key: String,
    http_client: Client,
    auth: Auth,
    options: ClientOptions,
}

impl ProfileDirectory {
    /// Create a new profile directory accessor
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
            "user_profiles",
            self.http_client.clone(),
        )
        .with_auth(&self.auth)
        .with_timeout(self.options.request_timeout)
    }

    /// Fetch a single profile
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, Error> {
        let mut rows: Vec<UserProfile> = self
            .table()
            .select("*")
            .eq("id", user_id)
            .limit(1)
            .fetch()
            .await?;
        Ok(rows.pop())
    }

    /// Every profile except the given user's, newest first
    pub async fn list_other_profiles(
        &self,
        exclude_user_id: &str,
    ) -> Result<Vec<UserProfile>, Error> {
        self.table()
            .select("*")
            .neq("id", exclude_user_id)
            .order("created_at", false)
            .fetch()
            .await
    }

    /// Whether a different profile already holds this friend code
    pub async fn friend_code_taken(
        &self,
        friend_code: &str,
        exclude_user_id: Option<&str>,
    ) -> Result<bool, Error> {
        let mut table = self
            .table()
            .select("id")
            .eq("friend_code", friend_code)
            .limit(1);
        if let Some(exclude) = exclude_user_id {
            table = table.neq("id", exclude);
        }
        let rows: Vec<IdRow> = table.fetch().await?;
        Ok(!rows.is_empty())
    }

    /// Whether a different profile already holds this username
    pub async fn username_taken(
        &self,
        username: &str,
        exclude_user_id: Option<&str>,
    ) -> Result<bool, Error> {
        let mut table = self.table().select("id").eq("username", username).limit(1);
        if let Some(exclude) = exclude_user_id {
            table = table.neq("id", exclude);
        }
        let rows: Vec<IdRow> = table.fetch().await?;
        Ok(!rows.is_empty())
    }

    /// Create or update a profile.
    ///
    /// Uniqueness of the friend code and username is checked with a read
    /// first; two concurrent writers can still both pass the check, a
    /// storage-level unique constraint (surfacing here as a conflict) is the
    /// real guarantee.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), Error> {
        if self
            .friend_code_taken(&profile.friend_code, Some(&profile.id))
            .await?
        {
            return Err(Error::DuplicateFriendCode);
        }
        if let Some(username) = &profile.username {
            if self.username_taken(username, Some(&profile.id)).await? {
                return Err(Error::DuplicateUsername);
            }
        }

        match self.table().merge_duplicates().insert(profile).await {
            Ok(()) => Ok(()),
            Err(Error::Conflict(details)) => Err(conflict_to_duplicate(&details)),
            Err(err) => Err(err),
        }
    }

    /// Create a profile with generated placeholder values if none exists.
    /// Safe to call redundantly.
    pub async fn ensure_profile(&self, user_id: &str) -> Result<UserProfile, Error> {
        if let Some(existing) = self.get_profile(user_id).await? {
            return Ok(existing);
        }

        let profile = UserProfile {
            id: user_id.to_string(),
            username: Some(placeholder_username(user_id)),
            friend_code: generate_friend_code(),
            created_at: None,
        };

        match self.table().ignore_duplicates().insert(&profile).await {
            Ok(()) => {
                log::info!("created profile for {}", user_id);
                Ok(profile)
            }
            // Lost a race with another session creating the same profile
            Err(Error::Conflict(_)) => self
                .get_profile(user_id)
                .await?
                .ok_or(Error::ProfileNotFound),
            Err(err) => Err(err),
        }
    }

    /// Claim a friend code for an existing profile
    pub async fn set_friend_code(&self, user_id: &str, friend_code: &str) -> Result<(), Error> {
        if !is_valid_friend_code(friend_code) {
            return Err(Error::validation(
                "please enter a valid 16-digit friend code",
            ));
        }
        if self.friend_code_taken(friend_code, Some(user_id)).await? {
            return Err(Error::DuplicateFriendCode);
        }

        let patch = serde_json::json!({ "friend_code": friend_code });
        let rows = match self.table().eq("id", user_id).update(&patch).await {
            Ok(rows) => rows,
            Err(Error::Conflict(_)) => return Err(Error::DuplicateFriendCode),
            Err(err) => return Err(err),
        };

        if rows.is_empty() {
            return Err(Error::ProfileNotFound);
        }
        Ok(())
    }

    /// Set or correct a profile's username
    pub async fn set_username(&self, user_id: &str, username: &str) -> Result<(), Error> {
        if username.is_empty() {
            return Err(Error::validation("username cannot be empty"));
        }
        if self.username_taken(username, Some(user_id)).await? {
            return Err(Error::DuplicateUsername);
        }

        let patch = serde_json::json!({ "username": username });
        let rows = match self.table().eq("id", user_id).update(&patch).await {
            Ok(rows) => rows,
            Err(Error::Conflict(_)) => return Err(Error::DuplicateUsername),
            Err(err) => return Err(err),
        };

        if rows.is_empty() {
            return Err(Error::ProfileNotFound);
        }
        Ok(())
    }
}

fn conflict_to_duplicate(details: &str) -> Error {
    if details.contains("friend_code") {
        Error::DuplicateFriendCode
    } else if details.contains("username") {
        Error::DuplicateUsername
    } else {
        Error::Conflict(details.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_username_uses_leading_hex_of_the_id() {
        assert_eq!(
            placeholder_username("9f8b7c6d-1234-5678-9abc-def012345678"),
            "user_9f8b7c6d"
        );
        assert_eq!(placeholder_username("abc"), "user_abc");
    }

    #[test]
    fn conflict_details_map_to_duplicate_errors() {
        assert!(matches!(
            conflict_to_duplicate("Code: 23505, Message: duplicate key value violates unique constraint \"user_profiles_friend_code_key\""),
            Error::DuplicateFriendCode
        ));
        assert!(matches!(
            conflict_to_duplicate("Code: 23505, Message: duplicate key value violates unique constraint \"user_profiles_username_key\""),
            Error::DuplicateUsername
        ));
        assert!(matches!(
            conflict_to_duplicate("Code: 23505, Message: something else"),
            Error::Conflict(_)
        ));
    }
}
