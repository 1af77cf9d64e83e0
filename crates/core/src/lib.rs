#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Heroes of Russia catalogue.
//!
//! This crate hosts the hero model, the catalogue filter and navigation
//! state, the admin store and form normalization, the remote API client
//! and the persisted session token used by the terminal UI.

pub mod admin;
pub mod catalogue;
pub mod config;
pub mod models;
pub mod remote;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::{AdminPanel, Commit, FormError, FormField, HeroForm};
pub use catalogue::{Catalogue, CatalogueView, HeroFilter, PeriodPreset, Selection};
pub use config::AppConfig;
pub use models::{Hero, TimelineEntry};
pub use remote::{ApiError, HeroesApi, Mutation, MutationSync, Outbox, SyncEvent, UploadedImage};
pub use token::TokenStore;
