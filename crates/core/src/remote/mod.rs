//! Remote records store: HTTP client and background mutation sync.

/// Async client for the records and authentication endpoints.
pub mod client;
/// Fire-and-forget mirroring of admin changes.
pub mod sync;

pub use client::{image_content_type, ApiError, HeroesApi, UploadedImage};
pub use sync::{Mutation, MutationSync, Outbox, SyncEvent};
