// src/services/list_keys.rs

//! Listing page keys.
//!
//! A paper appears on yearly and monthly listings of each of its categories
//! and archives. Physics papers also appear on the monthly physics group
//! listing; there is no yearly group listing.

use crate::models::keys;
use crate::models::taxonomy::PHYSICS_GROUP;
use crate::models::{CacheKeySet, ResolvedTaxonomy};

/// Expand the listing keys for a paper submitted in `year`/`month`.
pub fn list_keys(year: u16, month: u8, taxonomy: &ResolvedTaxonomy) -> CacheKeySet {
    let mut out = CacheKeySet::new();

    for tag in taxonomy.categories.iter().chain(&taxonomy.archives) {
        out.insert(keys::list_year(year, tag));
        out.insert(keys::list_month(year, month, tag));
    }

    let in_physics = taxonomy
        .groups
        .as_ref()
        .is_some_and(|groups| groups.contains(PHYSICS_GROUP));
    if in_physics {
        out.insert(keys::list_month(year, month, PHYSICS_GROUP));
    }

    out
}
