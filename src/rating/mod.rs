//! Rating aggregation.
//!
//! Averages are recomputed from the full stored set on every read rather
//! than maintained incrementally, so floating-point accumulation error does
//! not compound.

use anyhow::Result;
use std::sync::Arc;

use crate::catalog_store::{CatalogStore, Painting, PaintingWithRating, RatingSummary};

/// Computes per-painting rating aggregates on top of a catalog store.
#[derive(Clone)]
pub struct RatingAggregator {
    store: Arc<dyn CatalogStore>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Upsert one rater's score and return the fresh aggregate.
    ///
    /// Returns `None` if the painting does not exist. The rating value is
    /// stored as-is; the expected 1-5 range is not enforced.
    pub fn record_rating(
        &self,
        painting_id: i64,
        rater_id: &str,
        value: f64,
    ) -> Result<Option<RatingSummary>> {
        let Some(painting) = self.store.get_painting(painting_id)? else {
            return Ok(None);
        };

        self.store.upsert_rating(painting_id, rater_id, value)?;
        let values = self.store.ratings_for(painting_id)?;
        Ok(Some(summarize(&painting, &values)))
    }

    /// Current aggregate for one painting.
    pub fn summary_for(&self, painting: &Painting) -> Result<RatingSummary> {
        let values = self.store.ratings_for(painting.id)?;
        Ok(summarize(painting, &values))
    }

    /// Attach the computed aggregate to every painting in the batch.
    pub fn attach(&self, paintings: Vec<Painting>) -> Result<Vec<PaintingWithRating>> {
        let mut by_painting = self.store.ratings_by_painting()?;
        Ok(paintings
            .into_iter()
            .map(|painting| {
                let values = by_painting.remove(&painting.id).unwrap_or_default();
                let summary = summarize(&painting, &values);
                PaintingWithRating {
                    painting,
                    avg_rating: summary.avg_rating,
                    rating_count: summary.rating_count,
                }
            })
            .collect())
    }
}

/// Arithmetic mean of the stored values; with no ratings the painting's
/// static seed stands in and the count is zero.
fn summarize(painting: &Painting, values: &[f64]) -> RatingSummary {
    if values.is_empty() {
        return RatingSummary {
            avg_rating: painting.rating,
            rating_count: 0,
        };
    }
    RatingSummary {
        avg_rating: values.iter().sum::<f64>() / values.len() as f64,
        rating_count: values.len(),
    }
}
