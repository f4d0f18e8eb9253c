//! Database repository for the two store collections.
//!
//! The current-import collection is auto-keyed (the store assigns record ids
//! on insert); the snapshot collection is explicitly keyed by the caller.
//! Saved-dataset write-backs replace the whole records array, never a nested
//! element.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{ActivityRecord, Category, Coords, SavedSnapshot};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== CURRENT IMPORT (auto-keyed) ====================

    /// Replace the current import wholesale: clear the collection and insert
    /// the given records. The store assigns fresh ids, written back into the
    /// passed slice.
    pub async fn replace_records(
        &self,
        records: &mut [ActivityRecord],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records").execute(&mut *tx).await?;

        for record in records.iter_mut() {
            let result = sqlx::query(
                "INSERT INTO records (query, timestamp, category_id, category_name, category_color, lat, lon) VALUES (?, ?, ?, ?, ?, ?, ?)"
            )
            .bind(&record.query)
            .bind(&record.timestamp)
            .bind(&record.category.id)
            .bind(&record.category.name)
            .bind(&record.category.color)
            .bind(&record.coords.lat)
            .bind(&record.coords.lon)
            .execute(&mut *tx)
            .await?;

            record.id = Some(result.last_insert_rowid());
        }

        tx.commit().await?;
        Ok(())
    }

    /// List the current import in insertion order.
    pub async fn list_records(&self) -> Result<Vec<ActivityRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, query, timestamp, category_id, category_name, category_color, lat, lon FROM records ORDER BY id"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(record_from_row).collect())
    }

    /// Update exactly one record's category within the current import.
    pub async fn update_record_category(
        &self,
        id: i64,
        category: &Category,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE records SET category_id = ?, category_name = ?, category_color = ? WHERE id = ?"
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.color)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Record {} not found", id)));
        }
        Ok(())
    }

    /// Persist the categories of the given records within the current import.
    /// Records without an id (never persisted) are skipped.
    pub async fn update_record_categories(
        &self,
        records: &[ActivityRecord],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let Some(id) = record.id else { continue };
            sqlx::query(
                "UPDATE records SET category_id = ?, category_name = ?, category_color = ? WHERE id = ?"
            )
            .bind(&record.category.id)
            .bind(&record.category.name)
            .bind(&record.category.color)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ==================== SNAPSHOTS (explicitly keyed) ====================

    /// Save the given records as a named snapshot. Saving under an existing
    /// label supersedes that snapshot in place; otherwise a new entry is
    /// created under a fresh caller-assigned key.
    pub async fn put_snapshot(
        &self,
        label: &str,
        records: &[ActivityRecord],
    ) -> Result<SavedSnapshot, AppError> {
        let now = Utc::now().to_rfc3339();
        let records_json = serde_json::to_string(records)
            .map_err(|e| AppError::Internal(format!("Failed to encode snapshot: {}", e)))?;

        let existing: Option<String> = sqlx::query("SELECT id FROM snapshots WHERE label = ?")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.get("id"));

        let id = match existing {
            Some(id) => {
                sqlx::query("UPDATE snapshots SET records = ?, date = ? WHERE id = ?")
                    .bind(&records_json)
                    .bind(&now)
                    .bind(&id)
                    .execute(&self.pool)
                    .await?;
                id
            }
            None => {
                let id = format!(
                    "{}-{}",
                    Utc::now().timestamp_millis(),
                    uuid::Uuid::new_v4().simple()
                );
                sqlx::query(
                    "INSERT INTO snapshots (id, label, records, date) VALUES (?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(label)
                .bind(&records_json)
                .bind(&now)
                .execute(&self.pool)
                .await?;
                id
            }
        };

        Ok(SavedSnapshot {
            id,
            label: label.to_string(),
            records: records.to_vec(),
            date: now,
        })
    }

    /// List all labeled snapshots, most recently saved first.
    pub async fn list_snapshots(&self) -> Result<Vec<SavedSnapshot>, AppError> {
        let rows = sqlx::query(
            "SELECT id, label, records, date FROM snapshots WHERE label IS NOT NULL ORDER BY date DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }

    /// Look up one snapshot by its label.
    pub async fn get_snapshot_by_label(
        &self,
        label: &str,
    ) -> Result<Option<SavedSnapshot>, AppError> {
        let row = sqlx::query("SELECT id, label, records, date FROM snapshots WHERE label = ?")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(snapshot_from_row).transpose()
    }

    /// Replace the matching snapshot's entire records array and stamp a new
    /// save timestamp. This is the write-back contract for saved datasets.
    pub async fn rewrite_snapshot_records(
        &self,
        label: &str,
        records: &[ActivityRecord],
    ) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let records_json = serde_json::to_string(records)
            .map_err(|e| AppError::Internal(format!("Failed to encode snapshot: {}", e)))?;

        let result = sqlx::query("UPDATE snapshots SET records = ?, date = ? WHERE label = ?")
            .bind(&records_json)
            .bind(&now)
            .bind(label)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Saved dataset \"{}\" not found",
                label
            )));
        }
        Ok(())
    }

    /// Delete a snapshot by its key.
    pub async fn delete_snapshot(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM snapshots WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Snapshot {} not found", id)));
        }
        Ok(())
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> ActivityRecord {
    ActivityRecord {
        id: Some(row.get("id")),
        query: row.get("query"),
        timestamp: row.get("timestamp"),
        category: Category {
            id: row.get("category_id"),
            name: row.get("category_name"),
            color: row.get("category_color"),
        },
        coords: Coords {
            lat: row.get("lat"),
            lon: row.get("lon"),
        },
    }
}

fn snapshot_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SavedSnapshot, AppError> {
    let records_json: String = row.get("records");
    let mut records: Vec<ActivityRecord> = serde_json::from_str(&records_json)
        .map_err(|e| AppError::Database(format!("Unreadable snapshot records: {}", e)))?;

    // Snapshots written under a retired catalog are reconciled on read.
    for record in &mut records {
        record.category = Category::resolve(&record.category.id, &record.category.name);
    }

    Ok(SavedSnapshot {
        id: row.get("id"),
        label: row.get("label"),
        records,
        date: row.get("date"),
    })
}
