//! Trade-opportunity matching
//!
//! Pure computation over already-fetched data: given the requesting user's
//! missing-card set, every other user's missing-card set and the card
//! catalog, work out which cards could be obtained from whom. A user "has" a
//! card exactly when they have not marked it missing; ownership is never
//! stored directly.

use std::collections::{HashMap, HashSet};

use crate::catalog::Card;
use crate::profiles::UserProfile;

/// How candidates are selected and what gets attached to each match
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Only consider users with at least one missing-card record (a proxy
    /// for an engaged user)
    pub active_only: bool,

    /// Attach the cards each matched user needs that the requesting user
    /// owns, so callers can show what to offer in return
    pub include_offers: bool,
}

/// Another user known to hold a wanted card
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCandidate {
    pub user_id: String,
    pub display_name: String,
    pub friend_code: String,
    /// Cards this user needs that the requesting user owns; empty unless
    /// offers were requested
    pub offers: Vec<Card>,
}

/// A card the requesting user lacks, with everyone who can provide it
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOpportunity {
    pub card: Card,
    pub users_with_card: Vec<TradeCandidate>,
}

fn display_name(profile: &UserProfile) -> String {
    match &profile.username {
        Some(username) if !username.is_empty() => username.clone(),
        _ => format!("User {}", profile.friend_code),
    }
}

/// Compute trade opportunities.
///
/// `my_missing` is traversed in the order supplied, and ties in the final
/// sort keep that order, so the output is deterministic for a given input.
/// Card IDs absent from the catalog are dropped silently; the catalog is the
/// universe of cards that exist.
pub fn find_trade_opportunities(
    catalog: &[Card],
    my_missing: &[String],
    others_missing: &HashMap<String, HashSet<String>>,
    profiles: &[UserProfile],
    options: MatchOptions,
) -> Vec<TradeOpportunity> {
    let candidates: Vec<&UserProfile> = profiles
        .iter()
        .filter(|p| !options.active_only || others_missing.contains_key(&p.id))
        .collect();
    if candidates.is_empty() {
        return Vec::new();
    }

    let cards_by_id: HashMap<&str, &Card> =
        catalog.iter().map(|card| (card.id.as_str(), card)).collect();
    let my_missing_set: HashSet<&str> = my_missing.iter().map(String::as_str).collect();
    let empty = HashSet::new();

    let mut opportunities = Vec::new();

    for card_id in my_missing {
        let card = match cards_by_id.get(card_id.as_str()) {
            Some(card) => (*card).clone(),
            None => continue,
        };

        let mut users_with_card = Vec::new();
        for profile in &candidates {
            let their_missing = others_missing.get(&profile.id).unwrap_or(&empty);
            if their_missing.contains(card_id) {
                continue;
            }

            let offers = if options.include_offers {
                catalog
                    .iter()
                    .filter(|c| {
                        their_missing.contains(&c.id) && !my_missing_set.contains(c.id.as_str())
                    })
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };

            users_with_card.push(TradeCandidate {
                user_id: profile.id.clone(),
                display_name: display_name(profile),
                friend_code: profile.friend_code.clone(),
                offers,
            });
        }

        if !users_with_card.is_empty() {
            opportunities.push(TradeOpportunity {
                card,
                users_with_card,
            });
        }
    }

    // Rarest-held cards first; stable, so equal counts keep input order
    opportunities.sort_by_key(|o| o.users_with_card.len());
    opportunities
}
