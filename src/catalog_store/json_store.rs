//! Flat-file catalog store.
//!
//! The entire catalog is one pretty-printed JSON array document; every
//! mutation reads the full document, applies the change and rewrites the
//! whole file. Ratings live in a sibling `ratings.json` document keyed by
//! (painting_id, rater_id).

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::models::{Painting, PaintingDraft, PaintingPatch, RatingRow};
use super::trait_def::CatalogStore;

pub const PAINTINGS_FILE_NAME: &str = "paintings.json";
pub const RATINGS_FILE_NAME: &str = "ratings.json";

/// JSON-document-backed catalog store.
///
/// The mutex serializes in-process read-modify-write cycles; across
/// processes the last full rewrite still wins.
pub struct JsonCatalogStore {
    paintings_path: PathBuf,
    ratings_path: PathBuf,
    write_lock: Mutex<()>,
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read catalog file {:?}", path))
        }
    };
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse catalog file {:?}", path))
}

fn write_json_array<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let raw = serde_json::to_string_pretty(items)?;
    fs::write(path, raw).with_context(|| format!("Failed to write catalog file {:?}", path))
}

impl JsonCatalogStore {
    /// Open (or initialize) a JSON catalog under `data_dir`.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let store = JsonCatalogStore {
            paintings_path: data_dir.join(PAINTINGS_FILE_NAME),
            ratings_path: data_dir.join(RATINGS_FILE_NAME),
            write_lock: Mutex::new(()),
        };

        // Fail fast on corrupt documents rather than on the first request.
        store.read_paintings()?;
        store.read_ratings()?;
        Ok(store)
    }

    fn read_paintings(&self) -> Result<Vec<Painting>> {
        read_json_array(&self.paintings_path)
    }

    fn write_paintings(&self, paintings: &[Painting]) -> Result<()> {
        write_json_array(&self.paintings_path, paintings)
    }

    fn read_ratings(&self) -> Result<Vec<RatingRow>> {
        read_json_array(&self.ratings_path)
    }

    fn write_ratings(&self, ratings: &[RatingRow]) -> Result<()> {
        write_json_array(&self.ratings_path, ratings)
    }
}

impl CatalogStore for JsonCatalogStore {
    fn list_paintings(&self) -> Result<Vec<Painting>> {
        self.read_paintings()
    }

    fn get_painting(&self, id: i64) -> Result<Option<Painting>> {
        Ok(self.read_paintings()?.into_iter().find(|p| p.id == id))
    }

    fn insert_painting(&self, draft: PaintingDraft) -> Result<Painting> {
        let _guard = self.write_lock.lock().unwrap();
        let mut paintings = self.read_paintings()?;

        // max-plus-one of the current set, not a persistent counter.
        let max_id = paintings.iter().map(|p| p.id).max().unwrap_or(0);
        let painting = Painting {
            id: max_id + 1,
            title: draft.title,
            description: draft.description,
            price: draft.price,
            image: draft.image,
            category: draft.category,
            featured: draft.featured,
            rating: draft.rating,
        };

        paintings.push(painting.clone());
        self.write_paintings(&paintings)?;
        debug!("Inserted painting id={}", painting.id);
        Ok(painting)
    }

    fn update_painting(&self, id: i64, patch: PaintingPatch) -> Result<Option<Painting>> {
        let _guard = self.write_lock.lock().unwrap();
        let mut paintings = self.read_paintings()?;

        let Some(painting) = paintings.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        patch.apply_to(painting);
        let updated = painting.clone();

        self.write_paintings(&paintings)?;
        Ok(Some(updated))
    }

    fn delete_painting(&self, id: i64) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap();
        let paintings = self.read_paintings()?;

        let remaining: Vec<Painting> = paintings.iter().filter(|p| p.id != id).cloned().collect();
        if remaining.len() == paintings.len() {
            return Ok(false);
        }
        self.write_paintings(&remaining)?;

        // Ratings for the removed painting are dropped alongside it.
        let ratings = self.read_ratings()?;
        let remaining_ratings: Vec<RatingRow> = ratings
            .iter()
            .filter(|r| r.painting_id != id)
            .cloned()
            .collect();
        if remaining_ratings.len() != ratings.len() {
            self.write_ratings(&remaining_ratings)?;
        }
        Ok(true)
    }

    fn upsert_rating(&self, painting_id: i64, rater_id: &str, value: f64) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut ratings = self.read_ratings()?;

        match ratings
            .iter_mut()
            .find(|r| r.painting_id == painting_id && r.rater_id == rater_id)
        {
            Some(row) => row.rating = value,
            None => ratings.push(RatingRow {
                painting_id,
                rater_id: rater_id.to_string(),
                rating: value,
            }),
        }
        self.write_ratings(&ratings)
    }

    fn ratings_for(&self, painting_id: i64) -> Result<Vec<f64>> {
        Ok(self
            .read_ratings()?
            .into_iter()
            .filter(|r| r.painting_id == painting_id)
            .map(|r| r.rating)
            .collect())
    }

    fn ratings_by_painting(&self) -> Result<HashMap<i64, Vec<f64>>> {
        let mut by_painting: HashMap<i64, Vec<f64>> = HashMap::new();
        for row in self.read_ratings()? {
            by_painting.entry(row.painting_id).or_default().push(row.rating);
        }
        Ok(by_painting)
    }

    fn paintings_count(&self) -> usize {
        self.read_paintings().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::models::{DEFAULT_CATEGORY, DEFAULT_PRICE, DEFAULT_TITLE};
    use tempfile::TempDir;

    fn make_store() -> (TempDir, JsonCatalogStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonCatalogStore::new(dir.path()).unwrap();
        (dir, store)
    }

    fn draft(title: &str) -> PaintingDraft {
        PaintingDraft {
            title: title.to_string(),
            description: String::new(),
            price: DEFAULT_PRICE.to_string(),
            image: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            featured: false,
            rating: 4.0,
        }
    }

    #[test]
    fn missing_document_reads_as_empty_catalog() {
        let (_dir, store) = make_store();
        assert!(store.list_paintings().unwrap().is_empty());
        assert_eq!(store.paintings_count(), 0);
    }

    #[test]
    fn insert_assigns_max_plus_one() {
        let (_dir, store) = make_store();
        let first = store.insert_painting(draft("a")).unwrap();
        let second = store.insert_painting(draft("b")).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[test]
    fn id_of_deleted_max_is_reused() {
        // max-plus-one over the *current* set: deleting the highest id and
        // re-inserting hands that id out again.
        let (_dir, store) = make_store();
        store.insert_painting(draft("a")).unwrap();
        let second = store.insert_painting(draft("b")).unwrap();
        assert!(store.delete_painting(second.id).unwrap());

        let third = store.insert_painting(draft("c")).unwrap();
        assert_eq!(third.id, second.id);
    }

    #[test]
    fn id_not_recycled_from_holes() {
        let (_dir, store) = make_store();
        let first = store.insert_painting(draft("a")).unwrap();
        store.insert_painting(draft("b")).unwrap();
        assert!(store.delete_painting(first.id).unwrap());

        let third = store.insert_painting(draft("c")).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn update_merges_only_present_fields() {
        let (_dir, store) = make_store();
        let created = store.insert_painting(draft("before")).unwrap();

        let patch = PaintingPatch {
            title: Some("after".to_string()),
            ..Default::default()
        };
        let updated = store.update_painting(created.id, patch).unwrap().unwrap();

        assert_eq!(updated.title, "after");
        assert_eq!(updated.price, created.price);
        assert_eq!(updated.category, created.category);
        assert_eq!(updated.image, created.image);
        assert_eq!(updated.featured, created.featured);
    }

    #[test]
    fn update_unknown_id_returns_none() {
        let (_dir, store) = make_store();
        let result = store.update_painting(42, PaintingPatch::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn double_delete_reports_missing() {
        let (_dir, store) = make_store();
        let created = store.insert_painting(draft("x")).unwrap();
        assert!(store.delete_painting(created.id).unwrap());
        assert!(!store.delete_painting(created.id).unwrap());
    }

    #[test]
    fn rating_upsert_replaces_same_rater() {
        let (_dir, store) = make_store();
        let painting = store.insert_painting(draft("x")).unwrap();

        store.upsert_rating(painting.id, "rater-1", 3.0).unwrap();
        store.upsert_rating(painting.id, "rater-1", 5.0).unwrap();

        assert_eq!(store.ratings_for(painting.id).unwrap(), vec![5.0]);
    }

    #[test]
    fn ratings_grouped_by_painting() {
        let (_dir, store) = make_store();
        let a = store.insert_painting(draft("a")).unwrap();
        let b = store.insert_painting(draft("b")).unwrap();

        store.upsert_rating(a.id, "r1", 3.0).unwrap();
        store.upsert_rating(a.id, "r2", 5.0).unwrap();
        store.upsert_rating(b.id, "r1", 4.0).unwrap();

        let grouped = store.ratings_by_painting().unwrap();
        assert_eq!(grouped[&a.id].len(), 2);
        assert_eq!(grouped[&b.id], vec![4.0]);
    }

    #[test]
    fn delete_drops_ratings_for_painting() {
        let (_dir, store) = make_store();
        let painting = store.insert_painting(draft("x")).unwrap();
        store.upsert_rating(painting.id, "r1", 5.0).unwrap();

        assert!(store.delete_painting(painting.id).unwrap());
        assert!(store.ratings_for(painting.id).unwrap().is_empty());
    }

    #[test]
    fn catalog_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = JsonCatalogStore::new(dir.path()).unwrap();
            store.insert_painting(draft(DEFAULT_TITLE)).unwrap();
        }
        let reopened = JsonCatalogStore::new(dir.path()).unwrap();
        assert_eq!(reopened.paintings_count(), 1);
    }

    #[test]
    fn corrupt_document_is_rejected_at_open() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PAINTINGS_FILE_NAME), "not json").unwrap();
        assert!(JsonCatalogStore::new(dir.path()).is_err());
    }
}
