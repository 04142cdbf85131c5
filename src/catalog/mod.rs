//! Catalog service: validation, normalization and orchestration of painting
//! CRUD on top of a storage backend, with image persistence delegated to
//! the blob store.

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::blob_store::{BlobStore, BlobStoreError};
use crate::catalog_store::{
    CatalogStore, PaintingDraft, PaintingPatch, PaintingWithRating, RatingSummary,
    DEFAULT_CATEGORY, DEFAULT_PRICE, DEFAULT_SEED_RATING, DEFAULT_TITLE,
};
use crate::rating::RatingAggregator;

lazy_static! {
    static ref ALLOWED_IMAGE_EXT: Regex = Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif)$").unwrap();
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Painting not found")]
    NotFound,

    #[error("{0}")]
    UploadRejected(String),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobStoreError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Raw form fields from a multipart create/update request, all optional.
#[derive(Debug, Clone, Default)]
pub struct PaintingForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub featured: Option<String>,
    pub rating: Option<String>,
}

/// An uploaded image file: the client-supplied filename plus raw bytes.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Orchestrates catalog operations for both storage backends.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    blobs: Arc<dyn BlobStore>,
    ratings: RatingAggregator,
    max_upload_bytes: u64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// "true" (the string) and only "true" coerces to true.
fn coerce_featured(value: Option<&str>) -> bool {
    value == Some("true")
}

/// Seed rating: unparseable or zero falls back to the default.
fn parse_seed_rating(value: Option<&str>) -> f64 {
    value
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(DEFAULT_SEED_RATING)
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        blobs: Arc<dyn BlobStore>,
        max_upload_bytes: u64,
    ) -> Self {
        let ratings = RatingAggregator::new(store.clone());
        Self {
            store,
            blobs,
            ratings,
            max_upload_bytes,
        }
    }

    /// All paintings with their rating aggregate attached. Public.
    pub fn list_public(&self) -> Result<Vec<PaintingWithRating>, CatalogError> {
        let paintings = self.store.list_paintings()?;
        Ok(self.ratings.attach(paintings)?)
    }

    /// Create a painting from raw form fields and an optional upload.
    ///
    /// An uploaded file wins over a caller-supplied `image` string; an empty
    /// image is accepted. Field defaults follow the catalog conventions
    /// ("Untitled", "Landscape", the stock price line, seed rating 4).
    pub async fn create(
        &self,
        form: PaintingForm,
        upload: Option<ImageUpload>,
    ) -> Result<PaintingWithRating, CatalogError> {
        let image = match upload {
            Some(upload) => self.persist_upload(upload).await?,
            None => form.image.unwrap_or_default(),
        };

        let draft = PaintingDraft {
            title: non_empty(form.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: form.description.unwrap_or_default(),
            price: non_empty(form.price).unwrap_or_else(|| DEFAULT_PRICE.to_string()),
            image,
            category: non_empty(form.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            featured: coerce_featured(form.featured.as_deref()),
            rating: parse_seed_rating(form.rating.as_deref()),
        };

        let painting = self.store.insert_painting(draft)?;
        debug!(
            "Created painting id={} title={:?}",
            painting.id, painting.title
        );
        Ok(PaintingWithRating {
            avg_rating: painting.rating,
            rating_count: 0,
            painting,
        })
    }

    /// Partial update: only fields present in the form overwrite stored
    /// values. Image precedence: uploaded file, then non-empty supplied
    /// string, then the previous value.
    pub async fn update(
        &self,
        id: i64,
        form: PaintingForm,
        upload: Option<ImageUpload>,
    ) -> Result<PaintingWithRating, CatalogError> {
        let image = match upload {
            Some(upload) => Some(self.persist_upload(upload).await?),
            None => non_empty(form.image),
        };

        let patch = PaintingPatch {
            title: form.title,
            description: form.description,
            price: form.price,
            image,
            category: form.category,
            featured: form.featured.as_deref().map(|v| coerce_featured(Some(v))),
            rating: form.rating.and_then(|s| s.parse::<f64>().ok()),
        };

        let updated = self
            .store
            .update_painting(id, patch)?
            .ok_or(CatalogError::NotFound)?;

        let summary = self.ratings.summary_for(&updated)?;
        Ok(PaintingWithRating {
            painting: updated,
            avg_rating: summary.avg_rating,
            rating_count: summary.rating_count,
        })
    }

    /// Delete a painting. A second call for the same id reports NotFound.
    pub fn delete(&self, id: i64) -> Result<(), CatalogError> {
        if !self.store.delete_painting(id)? {
            return Err(CatalogError::NotFound);
        }
        debug!("Deleted painting id={}", id);
        Ok(())
    }

    /// Record one rater's score and return the fresh aggregate. Public.
    pub fn rate(&self, id: i64, rater_id: &str, value: f64) -> Result<RatingSummary, CatalogError> {
        self.ratings
            .record_rating(id, rater_id, value)?
            .ok_or(CatalogError::NotFound)
    }

    async fn persist_upload(&self, upload: ImageUpload) -> Result<String, CatalogError> {
        self.check_upload(&upload)?;
        Ok(self.blobs.put_image(&upload.filename, &upload.data).await?)
    }

    /// Extension allowlist and size limit, checked before any persistence.
    fn check_upload(&self, upload: &ImageUpload) -> Result<(), CatalogError> {
        if !ALLOWED_IMAGE_EXT.is_match(&upload.filename) {
            return Err(CatalogError::UploadRejected(
                "Only image files allowed (jpg, jpeg, png, webp, gif)".to_string(),
            ));
        }
        let size = upload.data.len() as u64;
        if size > self.max_upload_bytes {
            return Err(CatalogError::UploadRejected(format!(
                "File too large: {:#} (max {:#})",
                byte_unit::Byte::from(size),
                byte_unit::Byte::from(self.max_upload_bytes),
            )));
        }
        Ok(())
    }
}
