// src/models/mod.rs

//! Domain models for the purger.
//!
//! This module contains the data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
mod config;
mod event;
mod identifier;
pub mod keys;
pub mod taxonomy;

// Re-export all public types
pub use announcement::{AnnouncementMethod, AnnouncementRecord, PaperMetadata};
pub use config::{
    Config, Environment, EnvironmentsConfig, ObjectsConfig, PurgeConfig, PurgeTarget,
    RetryConfig, TargetKind, TargetsConfig,
};
pub use event::{
    ANNOUNCEMENT_COMPLETE, ControlMessage, Invocation, PaperPurgeRequest, PubSubEnvelope,
    PubSubMessage, StorageChangeEvent,
};
pub use identifier::PaperId;
pub use keys::{ArtifactKind, CacheKeySet};
pub use taxonomy::{ResolvedTaxonomy, TAXONOMY, Taxonomy};
