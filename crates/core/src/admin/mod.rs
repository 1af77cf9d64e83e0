#![allow(missing_docs)]

//! Password-gated record management: the owned hero list and the add/edit dialog.

/// Raw dialog buffer and its normalization into structured records.
pub mod form;
/// Owned hero list with unique ids.
pub mod store;

pub use form::{FormError, FormField, HeroDraft, HeroForm};
pub use store::{HeroStore, StoreError};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::Hero;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful dialog submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Created(Hero),
    Updated(Hero),
}

impl Commit {
    pub fn hero(&self) -> &Hero {
        match self {
            Commit::Created(hero) | Commit::Updated(hero) => hero,
        }
    }
}

/// Admin controller. The store is only changed through `submit`, `delete` and `reassign_id`.
#[derive(Debug, Default)]
pub struct AdminPanel {
    store: HeroStore,
    form: HeroForm,
    editing: Option<i64>,
    dialog_open: bool,
}

impl AdminPanel {
    pub fn new(heroes: Vec<Hero>) -> Self {
        Self {
            store: HeroStore::new(heroes),
            ..Self::default()
        }
    }

    /// Replace the whole list, e.g. after a fresh fetch. Closes any open dialog.
    pub fn reset(&mut self, heroes: Vec<Hero>) {
        self.store = HeroStore::new(heroes);
        self.close_dialog();
    }

    pub fn heroes(&self) -> &[Hero] {
        self.store.heroes()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn form(&self) -> &HeroForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut HeroForm {
        &mut self.form
    }

    pub fn start_create(&mut self) {
        self.form = HeroForm::default();
        self.editing = None;
        self.dialog_open = true;
    }

    pub fn start_edit(&mut self, id: i64) -> bool {
        let Some(hero) = self.store.get(id) else {
            return false;
        };
        self.form = HeroForm::from_hero(hero);
        self.editing = Some(id);
        self.dialog_open = true;
        true
    }

    pub fn cancel(&mut self) {
        self.close_dialog();
    }

    /// Normalize the buffer and apply it. On error the dialog stays open with its contents.
    pub fn submit(&mut self) -> Result<Commit, AdminError> {
        let draft = self.form.normalize()?;
        let commit = match self.editing {
            Some(id) => {
                let hero = draft.into_hero(id);
                self.store.replace(hero.clone())?;
                info!(id, "Hero updated");
                Commit::Updated(hero)
            }
            None => {
                let hero = draft.into_hero(self.store.next_id()?);
                self.store.insert(hero.clone())?;
                info!(id = hero.id, total = self.store.len(), "Hero created");
                Commit::Created(hero)
            }
        };
        self.close_dialog();
        Ok(commit)
    }

    /// Remove a hero. Returns the removed record, or `None` when the id was unknown.
    pub fn delete(&mut self, id: i64) -> Option<Hero> {
        let removed = self.store.remove(id);
        match &removed {
            Some(_) => info!(id, total = self.store.len(), "Hero deleted"),
            None => debug!(id, "Delete of unknown hero ignored"),
        }
        if self.editing == Some(id) {
            self.close_dialog();
        }
        removed
    }

    /// Adopt the id the remote store assigned to a locally created hero.
    pub fn reassign_id(&mut self, from: i64, to: i64) -> Result<(), StoreError> {
        self.store.reassign_id(from, to)?;
        if self.editing == Some(from) {
            self.editing = Some(to);
        }
        Ok(())
    }

    fn close_dialog(&mut self) {
        self.dialog_open = false;
        self.form = HeroForm::default();
        self.editing = None;
    }
}
