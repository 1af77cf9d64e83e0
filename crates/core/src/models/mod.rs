//! Shared domain models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One biographical catalogue entry as served by the records endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    /// Identifier assigned by the remote store, or synthesized locally.
    pub id: i64,
    /// Full name.
    pub name: String,
    /// Rank or role.
    pub rank: String,
    /// Portrait URI.
    pub image: String,
    /// Free-text life span, e.g. `1916-2001`.
    pub period: String,
    /// Conflict category used by the period filter.
    pub conflict: String,
    /// Region category used by the region filter.
    #[serde(default)]
    pub region: String,
    /// Awards in the order they were entered.
    #[serde(default)]
    pub awards: Vec<String>,
    /// Year of birth.
    pub birth_year: i32,
    /// Biography text.
    pub biography: String,
    /// Chronological events, kept in entry order.
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

/// Single dated event in a hero's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Calendar year of the event.
    pub year: i32,
    /// What happened.
    pub event: String,
}

impl Hero {
    /// Returns a user-facing label combining name and rank.
    pub fn display_name(&self) -> String {
        if self.rank.is_empty() {
            self.name.clone()
        } else {
            format!("{} · {}", self.name, self.rank)
        }
    }

    /// First `limit` awards followed by a `+N` marker for the remainder.
    pub fn award_summary(&self, limit: usize) -> Vec<String> {
        let mut summary: Vec<String> = self.awards.iter().take(limit).cloned().collect();
        if self.awards.len() > limit {
            summary.push(format!("+{}", self.awards.len() - limit));
        }
        summary
    }
}

/// Keep the first hero for every id, in source order.
pub fn unique_by_id(heroes: Vec<Hero>) -> Vec<Hero> {
    let mut seen = HashSet::with_capacity(heroes.len());
    heroes
        .into_iter()
        .filter(|hero| {
            let fresh = seen.insert(hero.id);
            if !fresh {
                warn!(id = hero.id, "Dropping hero with duplicate id");
            }
            fresh
        })
        .collect()
}
