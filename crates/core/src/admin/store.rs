use chrono::Utc;
use thiserror::Error;

use crate::models::{unique_by_id, Hero};

/// Violations of the store's id invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("hero id {0} is already in use")]
    DuplicateId(i64),

    #[error("no hero with id {0}")]
    UnknownId(i64),

    #[error("no free hero id after {0}")]
    IdSpaceExhausted(i64),
}

/// Owned, ordered list of heroes with unique ids.
#[derive(Debug, Clone, Default)]
pub struct HeroStore {
    heroes: Vec<Hero>,
}

impl HeroStore {
    /// Build a store from fetched data. Later duplicates of an id are dropped.
    pub fn new(heroes: Vec<Hero>) -> Self {
        Self {
            heroes: unique_by_id(heroes),
        }
    }

    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Hero> {
        self.heroes.iter().find(|hero| hero.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// Fresh id derived from the clock, bumped past every id already in use.
    pub fn next_id(&self) -> Result<i64, StoreError> {
        let now = Utc::now().timestamp_millis();
        match self.heroes.iter().map(|hero| hero.id).max() {
            Some(max) if max >= now => {
                let next = max.checked_add(1).ok_or(StoreError::IdSpaceExhausted(max))?;
                Ok(next)
            }
            _ => Ok(now),
        }
    }

    /// Append at the end of the list.
    pub fn insert(&mut self, hero: Hero) -> Result<(), StoreError> {
        if self.contains(hero.id) {
            return Err(StoreError::DuplicateId(hero.id));
        }
        self.heroes.push(hero);
        Ok(())
    }

    /// Swap in a new version of an existing hero, keeping its position.
    pub fn replace(&mut self, hero: Hero) -> Result<(), StoreError> {
        let slot = self
            .heroes
            .iter_mut()
            .find(|existing| existing.id == hero.id)
            .ok_or(StoreError::UnknownId(hero.id))?;
        *slot = hero;
        Ok(())
    }

    /// Remove by id. Missing ids are not an error.
    pub fn remove(&mut self, id: i64) -> Option<Hero> {
        let position = self.heroes.iter().position(|hero| hero.id == id)?;
        Some(self.heroes.remove(position))
    }

    /// Replace a transient id with the one the remote store assigned.
    pub fn reassign_id(&mut self, from: i64, to: i64) -> Result<(), StoreError> {
        if from == to {
            return Ok(());
        }
        if self.contains(to) {
            return Err(StoreError::DuplicateId(to));
        }
        let hero = self
            .heroes
            .iter_mut()
            .find(|hero| hero.id == from)
            .ok_or(StoreError::UnknownId(from))?;
        hero.id = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hero, sample_heroes};

    #[test]
    fn synthesized_ids_never_collide() {
        let mut store = HeroStore::new(sample_heroes());
        let initial = store.len();
        for n in 0..50 {
            let id = store.next_id().expect("id space left");
            store
                .insert(hero(id, &format!("Новый {n}")))
                .expect("synthesized id is unique");
        }
        let mut ids: Vec<i64> = store.heroes().iter().map(|hero| hero.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), initial + 50);
    }

    #[test]
    fn next_id_skips_ids_from_the_future() {
        let far = Utc::now().timestamp_millis() + 1_000_000;
        let store = HeroStore::new(vec![hero(far, "Будущий")]);
        assert_eq!(store.next_id(), Ok(far + 1));
    }

    #[test]
    fn next_id_reports_exhausted_id_space() {
        let store = HeroStore::new(vec![hero(i64::MAX, "Последний")]);
        assert_eq!(store.next_id(), Err(StoreError::IdSpaceExhausted(i64::MAX)));
    }

    #[test]
    fn new_drops_duplicate_ids() {
        let store = HeroStore::new(vec![hero(1, "Первый"), hero(1, "Копия"), hero(2, "Второй")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).map(|hero| hero.name.as_str()), Some("Первый"));
    }

    #[test]
    fn replace_keeps_position() {
        let mut store = HeroStore::new(sample_heroes());
        let mut updated = hero(2, "Обновлённая");
        updated.rank = "Новое звание".to_string();
        store.replace(updated.clone()).expect("id 2 exists");

        let ids: Vec<i64> = store.heroes().iter().map(|hero| hero.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(store.heroes()[1], updated);
        assert_eq!(
            store.replace(hero(99, "Нет")),
            Err(StoreError::UnknownId(99))
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = HeroStore::new(sample_heroes());
        assert!(store.remove(3).is_some());
        assert!(store.remove(3).is_none());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn reassign_id_rejects_collisions() {
        let mut store = HeroStore::new(sample_heroes());
        assert_eq!(store.reassign_id(5, 1), Err(StoreError::DuplicateId(1)));
        store.reassign_id(5, 42).expect("42 is free");
        assert!(store.contains(42));
        assert!(!store.contains(5));
        assert_eq!(store.heroes()[4].id, 42);
    }
}
