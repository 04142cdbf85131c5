mod json_store;
mod models;
mod schema;
mod sqlite_store;
mod trait_def;

pub use json_store::JsonCatalogStore;
pub use models::{
    Painting, PaintingDraft, PaintingPatch, PaintingWithRating, RatingRow, RatingSummary,
    DEFAULT_CATEGORY, DEFAULT_PRICE, DEFAULT_SEED_RATING, DEFAULT_TITLE,
};
pub use sqlite_store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
