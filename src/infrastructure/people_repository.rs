//! SQLite-backed [`PersistenceSink`] for the `people` table.
//!
//! Writes between two checkpoints share one transaction, so a chunk is either
//! committed as a whole or, if the process dies first, not at all.

use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::debug;

use crate::domain::{PersistenceSink, PersonRecord, StoreError};
use crate::infrastructure::database_connection::CREATE_PEOPLE_TABLE_SQL;

const UPSERT_PERSON_SQL: &str = r"
    INSERT INTO people
    (id, name, birth_year, eye_color, gender, hair_color, homeworld, mass, skin_color)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        birth_year = excluded.birth_year,
        eye_color = excluded.eye_color,
        gender = excluded.gender,
        hair_color = excluded.hair_color,
        homeworld = excluded.homeworld,
        mass = excluded.mass,
        skin_color = excluded.skin_color
";

const SELECT_PERSON_COLUMNS: &str =
    "SELECT id, name, birth_year, eye_color, gender, hair_color, homeworld, mass, skin_color FROM people";

pub struct PeopleRepository {
    pool: Arc<SqlitePool>,
    tx: Option<Transaction<'static, Sqlite>>,
    checkpoints: usize,
}

impl PeopleRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            pool,
            tx: None,
            checkpoints: 0,
        }
    }

    /// Checkpoints committed through this repository
    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }

    /// Whether writes are waiting for the next checkpoint
    pub fn has_pending_writes(&self) -> bool {
        self.tx.is_some()
    }

    pub async fn table_exists(&self) -> Result<bool, StoreError> {
        let found = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'people'")
            .fetch_optional(&*self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Committed row count
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people")
            .fetch_one(&*self.pool)
            .await?;
        Ok(count)
    }

    pub async fn column_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("PRAGMA table_info(people)")
            .fetch_all(&*self.pool)
            .await?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(row.try_get::<String, _>("name")?);
        }
        Ok(names)
    }

    pub async fn get(&self, id: i64) -> Result<Option<PersonRecord>, StoreError> {
        let record = sqlx::query_as::<_, PersonRecord>(&format!("{SELECT_PERSON_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(record)
    }

    /// First `limit` rows by key
    pub async fn sample(&self, limit: i64) -> Result<Vec<PersonRecord>, StoreError> {
        let records = sqlx::query_as::<_, PersonRecord>(&format!("{SELECT_PERSON_COLUMNS} ORDER BY id LIMIT ?"))
            .bind(limit)
            .fetch_all(&*self.pool)
            .await?;
        Ok(records)
    }

    pub async fn all(&self) -> Result<Vec<PersonRecord>, StoreError> {
        let records = sqlx::query_as::<_, PersonRecord>(&format!("{SELECT_PERSON_COLUMNS} ORDER BY id"))
            .fetch_all(&*self.pool)
            .await?;
        Ok(records)
    }
}

#[async_trait]
impl PersistenceSink for PeopleRepository {
    async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        sqlx::query(CREATE_PEOPLE_TABLE_SQL).execute(&*self.pool).await?;
        Ok(())
    }

    async fn upsert(&mut self, record: &PersonRecord) -> Result<(), StoreError> {
        let mut tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.pool.begin().await?,
        };

        let result = sqlx::query(UPSERT_PERSON_SQL)
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.birth_year)
            .bind(&record.eye_color)
            .bind(&record.gender)
            .bind(&record.hair_color)
            .bind(&record.homeworld)
            .bind(&record.mass)
            .bind(&record.skin_color)
            .execute(&mut *tx)
            .await;

        self.tx = Some(tx);
        result?;
        Ok(())
    }

    async fn checkpoint(&mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        self.checkpoints += 1;
        debug!("💾 Checkpoint {} committed", self.checkpoints);
        Ok(())
    }
}
