//! Service layer for the purger.
//!
//! This module contains the key derivation logic:
//! - Listing page keys (`list_keys`)
//! - Announcement batches (`AnnouncementKeyBuilder`)
//! - Changed storage objects (`StorageKeyMapper`)
//! - Whole-paper purges (`paper_keys`)

mod announce;
mod list_keys;
mod paper;
mod storage_keys;

pub use announce::{AnnouncementKeyBuilder, BatchKeys, RecordFailure};
pub use list_keys::list_keys;
pub use paper::paper_keys;
pub use storage_keys::StorageKeyMapper;
