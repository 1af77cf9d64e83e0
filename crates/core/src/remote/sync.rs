#![allow(missing_docs)]

//! Background mirroring of admin mutations.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::client::{ApiError, HeroesApi};
use crate::models::Hero;

/// A local admin change to mirror on the remote store.
#[derive(Debug, Clone)]
pub enum Mutation {
    Create(Hero),
    Update(Hero),
    Delete(i64),
}

impl Mutation {
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "create",
            Mutation::Update(_) => "update",
            Mutation::Delete(_) => "delete",
        }
    }

    /// Id of the hero the mutation is about.
    pub fn target(&self) -> i64 {
        match self {
            Mutation::Create(hero) | Mutation::Update(hero) => hero.id,
            Mutation::Delete(id) => *id,
        }
    }

    fn retarget(self, id: i64) -> Self {
        match self {
            Mutation::Create(mut hero) => {
                hero.id = id;
                Mutation::Create(hero)
            }
            Mutation::Update(mut hero) => {
                hero.id = id;
                Mutation::Update(hero)
            }
            Mutation::Delete(_) => Mutation::Delete(id),
        }
    }
}

/// Orders mutations behind creates the remote store has not acknowledged yet.
///
/// A locally created hero carries a transient id until its `Created` event
/// arrives. Updates and deletes aimed at it are held here and released,
/// rewritten to the server id, by [`Outbox::acknowledge`].
#[derive(Debug, Default)]
pub struct Outbox {
    pending: HashMap<i64, Vec<Mutation>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutation when it can be sent now, or `None` when it was queued.
    pub fn route(&mut self, mutation: Mutation) -> Option<Mutation> {
        let target = mutation.target();
        if let Mutation::Create(_) = mutation {
            self.pending.entry(target).or_default();
            return Some(mutation);
        }
        match self.pending.get_mut(&target) {
            Some(queue) => {
                debug!(id = target, mutation = mutation.label(), "Held until create is acknowledged");
                queue.push(mutation);
                None
            }
            None => Some(mutation),
        }
    }

    /// The create for `local_id` landed as `remote_id`: release what waited on it.
    pub fn acknowledge(&mut self, local_id: i64, remote_id: i64) -> Vec<Mutation> {
        self.pending
            .remove(&local_id)
            .unwrap_or_default()
            .into_iter()
            .map(|mutation| mutation.retarget(remote_id))
            .collect()
    }

    /// The create for `local_id` failed; anything queued behind it is dropped.
    pub fn abandon(&mut self, local_id: i64) -> usize {
        self.pending.remove(&local_id).map_or(0, |queue| queue.len())
    }

    pub fn is_pending(&self, local_id: i64) -> bool {
        self.pending.contains_key(&local_id)
    }

    /// True when a delete for `local_id` is waiting to be replayed.
    pub fn deletes(&self, local_id: i64) -> bool {
        self.pending
            .get(&local_id)
            .is_some_and(|queue| queue.iter().any(|m| matches!(m, Mutation::Delete(_))))
    }
}

/// Events emitted by the async mutation sync.
#[derive(Debug)]
pub enum SyncEvent {
    /// The remote store accepted a new hero and assigned it an id.
    Created {
        /// Transient id the hero carried locally.
        local_id: i64,
        /// Record as stored remotely.
        hero: Hero,
    },
    /// The remote copy now matches the local edit.
    Updated(Hero),
    /// Delete finished; `existed` is false when the server did not know the id.
    Deleted { id: i64, existed: bool },
    /// The mutation failed. Local state is left as it is.
    Failed {
        mutation: &'static str,
        /// Hero the mutation targeted.
        id: i64,
        error: ApiError,
    },
}

/// Pushes one admin mutation to the remote store.
pub struct MutationSync {
    api: HeroesApi,
    token: String,
}

impl MutationSync {
    pub fn new(api: HeroesApi, token: impl Into<String>) -> Self {
        Self {
            api,
            token: token.into(),
        }
    }

    /// Perform the mutation, reporting the outcome on `sender`. No retries.
    pub async fn run(self, mutation: Mutation, sender: mpsc::Sender<SyncEvent>) -> Result<()> {
        let label = mutation.label();
        let id = mutation.target();
        let event = match self.apply(mutation).await {
            Ok(event) => {
                info!(mutation = label, "Remote sync succeeded");
                event
            }
            Err(error) => {
                warn!(mutation = label, id, %error, "Remote sync failed");
                SyncEvent::Failed {
                    mutation: label,
                    id,
                    error,
                }
            }
        };
        sender
            .send(event)
            .await
            .context("failed to send sync event")?;
        Ok(())
    }

    async fn apply(&self, mutation: Mutation) -> Result<SyncEvent, ApiError> {
        match mutation {
            Mutation::Create(hero) => {
                let stored = self.api.create_hero(&hero, &self.token).await?;
                Ok(SyncEvent::Created {
                    local_id: hero.id,
                    hero: stored,
                })
            }
            Mutation::Update(hero) => {
                let stored = self.api.update_hero(&hero, &self.token).await?;
                Ok(SyncEvent::Updated(stored))
            }
            Mutation::Delete(id) => {
                let existed = self.api.delete_hero(id, &self.token).await?;
                Ok(SyncEvent::Deleted { id, existed })
            }
        }
    }
}
