//! SQLite-backed catalog store implementation.
//!
//! The relational variant of the catalog: row-level mutations, ids assigned
//! by the engine, rating upserts resolved by a unique (painting_id,
//! rater_id) constraint.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use super::models::{Painting, PaintingDraft, PaintingPatch};
use super::schema::GALLERY_SCHEMA_SQL;
use super::trait_def::CatalogStore;

pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

fn row_to_painting(row: &rusqlite::Row) -> rusqlite::Result<Painting> {
    Ok(Painting {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        price: row.get("price")?,
        image: row.get("image")?,
        category: row.get("category")?,
        featured: row.get::<_, i64>("featured")? != 0,
        rating: row.get("rating")?,
    })
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog database {:?}", path))?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        conn.execute_batch(GALLERY_SCHEMA_SQL)
            .context("Failed to create catalog schema")?;

        let painting_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM paintings", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened gallery catalog at {:?}: {} paintings",
            path, painting_count
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn list_paintings(&self) -> Result<Vec<Painting>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, title, description, price, image, category, featured, rating
             FROM paintings ORDER BY id",
        )?;
        let paintings = stmt
            .query_map([], row_to_painting)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(paintings)
    }

    fn get_painting(&self, id: i64) -> Result<Option<Painting>> {
        let conn = self.conn.lock().unwrap();
        let painting = conn
            .query_row(
                "SELECT id, title, description, price, image, category, featured, rating
                 FROM paintings WHERE id = ?1",
                params![id],
                row_to_painting,
            )
            .optional()?;
        Ok(painting)
    }

    fn insert_painting(&self, draft: PaintingDraft) -> Result<Painting> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO paintings (title, description, price, image, category, featured, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                draft.title,
                draft.description,
                draft.price,
                draft.image,
                draft.category,
                draft.featured as i64,
                draft.rating,
                Utc::now().timestamp_millis(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(Painting {
            id,
            title: draft.title,
            description: draft.description,
            price: draft.price,
            image: draft.image,
            category: draft.category,
            featured: draft.featured,
            rating: draft.rating,
        })
    }

    fn update_painting(&self, id: i64, patch: PaintingPatch) -> Result<Option<Painting>> {
        let conn = self.conn.lock().unwrap();
        let existing = conn
            .query_row(
                "SELECT id, title, description, price, image, category, featured, rating
                 FROM paintings WHERE id = ?1",
                params![id],
                row_to_painting,
            )
            .optional()?;
        let Some(mut painting) = existing else {
            return Ok(None);
        };
        patch.apply_to(&mut painting);

        conn.execute(
            "UPDATE paintings
             SET title = ?1, description = ?2, price = ?3, image = ?4,
                 category = ?5, featured = ?6, rating = ?7
             WHERE id = ?8",
            params![
                painting.title,
                painting.description,
                painting.price,
                painting.image,
                painting.category,
                painting.featured as i64,
                painting.rating,
                id,
            ],
        )?;
        Ok(Some(painting))
    }

    fn delete_painting(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM paintings WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn upsert_rating(&self, painting_id: i64, rater_id: &str, value: f64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO ratings (painting_id, rater_id, rating, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (painting_id, rater_id)
             DO UPDATE SET rating = excluded.rating, created_at = excluded.created_at",
            params![painting_id, rater_id, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn ratings_for(&self, painting_id: i64) -> Result<Vec<f64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT rating FROM ratings WHERE painting_id = ?1")?;
        let values = stmt
            .query_map(params![painting_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(values)
    }

    fn ratings_by_painting(&self) -> Result<HashMap<i64, Vec<f64>>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT painting_id, rating FROM ratings")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut by_painting: HashMap<i64, Vec<f64>> = HashMap::new();
        for (painting_id, rating) in rows {
            by_painting.entry(painting_id).or_default().push(rating);
        }
        Ok(by_painting)
    }

    fn paintings_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM paintings", [], |r| r.get::<_, i64>(0))
            .unwrap_or(0) as usize
    }
}
