//! CatalogStore trait definition.
//!
//! This trait abstracts catalog persistence so the service layer can work
//! with either the flat-file `JsonCatalogStore` or the relational
//! `SqliteCatalogStore` transparently.

use anyhow::Result;
use std::collections::HashMap;

use super::models::{Painting, PaintingDraft, PaintingPatch};

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Painting CRUD
    // =========================================================================

    /// All paintings, in id order.
    fn list_paintings(&self) -> Result<Vec<Painting>>;

    /// Get a painting by id.
    fn get_painting(&self, id: i64) -> Result<Option<Painting>>;

    /// Insert a painting, assigning its id. Returns the stored row.
    fn insert_painting(&self, draft: PaintingDraft) -> Result<Painting>;

    /// Shallow partial merge of `patch` onto the stored painting.
    /// Returns `None` if the id does not exist.
    fn update_painting(&self, id: i64, patch: PaintingPatch) -> Result<Option<Painting>>;

    /// Delete a painting. Returns `false` if the id does not exist.
    fn delete_painting(&self, id: i64) -> Result<bool>;

    // =========================================================================
    // Rating persistence
    // =========================================================================

    /// Upsert keyed by (`painting_id`, `rater_id`): a conflicting key
    /// replaces the prior value instead of inserting a duplicate.
    fn upsert_rating(&self, painting_id: i64, rater_id: &str, value: f64) -> Result<()>;

    /// All stored rating values for one painting.
    fn ratings_for(&self, painting_id: i64) -> Result<Vec<f64>>;

    /// All stored rating values, grouped by painting id.
    fn ratings_by_painting(&self) -> Result<HashMap<i64, Vec<f64>>>;

    // =========================================================================
    // Counts (for startup logging)
    // =========================================================================

    /// Number of paintings in the catalog.
    fn paintings_count(&self) -> usize;
}
