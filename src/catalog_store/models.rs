//! Data models for the painting catalog.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_PRICE: &str = "Contact for a personalized quote";
pub const DEFAULT_CATEGORY: &str = "Landscape";
pub const DEFAULT_SEED_RATING: f64 = 4.0;

fn default_seed_rating() -> f64 {
    DEFAULT_SEED_RATING
}

/// One artwork in the gallery catalog.
///
/// The `rating` field is the static seed value shown until real ratings
/// arrive; the computed aggregate lives in [`PaintingWithRating`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Painting {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category: String,
    pub featured: bool,
    #[serde(default = "default_seed_rating")]
    pub rating: f64,
}

/// Field values for a painting about to be inserted.
///
/// The store assigns the id; everything else is already normalized by the
/// catalog service.
#[derive(Debug, Clone)]
pub struct PaintingDraft {
    pub title: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub category: String,
    pub featured: bool,
    pub rating: f64,
}

/// Partial update for a painting. `None` fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct PaintingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub rating: Option<f64>,
}

impl PaintingPatch {
    /// Shallow merge onto an existing painting. The id never changes.
    pub fn apply_to(&self, painting: &mut Painting) {
        if let Some(title) = &self.title {
            painting.title = title.clone();
        }
        if let Some(description) = &self.description {
            painting.description = description.clone();
        }
        if let Some(price) = &self.price {
            painting.price = price.clone();
        }
        if let Some(image) = &self.image {
            painting.image = image.clone();
        }
        if let Some(category) = &self.category {
            painting.category = category.clone();
        }
        if let Some(featured) = self.featured {
            painting.featured = featured;
        }
        if let Some(rating) = self.rating {
            painting.rating = rating;
        }
    }
}

/// One rater's score for one painting. At most one row exists per
/// (`painting_id`, `rater_id`) pair; re-rating replaces the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    pub painting_id: i64,
    pub rater_id: String,
    pub rating: f64,
}

/// Painting plus the rating aggregate computed at read time.
#[derive(Debug, Clone, Serialize)]
pub struct PaintingWithRating {
    #[serde(flatten)]
    pub painting: Painting,
    pub avg_rating: f64,
    pub rating_count: usize,
}

/// Computed (average, count) pair for one painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub rating_count: usize,
}
