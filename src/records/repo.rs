use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use super::pagination::{Page, PageRequest};
use super::repo_types::{
    now_seconds, NewRecord, OwnerId, Record, RecordId, RecordRow, RecordType, RecordUpdate,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("record {id} is not owned by {owner}")]
    OwnerMismatch { id: RecordId, owner: OwnerId },
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence for records. Each method is one unit of work.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Stores a new record and assigns its id.
    async fn insert(&self, record: NewRecord) -> Result<Record, StoreError>;

    /// Replaces the mutable fields of `id` and refreshes `updated_at`.
    /// Fails with `OwnerMismatch` without writing when the stored owner differs.
    async fn update_by_id(&self, id: &RecordId, update: RecordUpdate)
        -> Result<Record, StoreError>;

    async fn delete_by_id(&self, id: &RecordId) -> Result<(), StoreError>;

    /// One page of the owner's records of the given type, newest first.
    async fn list_by_owner_and_type(
        &self,
        owner: &OwnerId,
        record_type: RecordType,
        page: PageRequest,
    ) -> Result<Page<Record>, StoreError>;
}

const RECORD_COLUMNS: &str =
    "id, owner_id, record_type, title, description, amount, date, created_at, updated_at";

#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<Record, StoreError> {
        let id = RecordId::generate();
        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            INSERT INTO records
                (id, owner_id, record_type, title, description, amount, date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(record.owner_id.as_str())
        .bind(record.record_type.number())
        .bind(&record.title)
        .bind(&record.description)
        .bind(record.amount)
        .bind(&record.date)
        .bind(record.created_at)
        .fetch_one(&self.db)
        .await
        .context("insert record")?;

        Ok(Record::try_from(row)?)
    }

    async fn update_by_id(
        &self,
        id: &RecordId,
        update: RecordUpdate,
    ) -> Result<Record, StoreError> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let owner: Option<(String,)> =
            sqlx::query_as(r#"SELECT owner_id FROM records WHERE id = $1 FOR UPDATE"#)
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .context("lock record")?;

        let Some((stored_owner,)) = owner else {
            return Err(StoreError::NotFound(id.clone()));
        };
        if stored_owner != update.owner_id.as_str() {
            return Err(StoreError::OwnerMismatch {
                id: id.clone(),
                owner: update.owner_id,
            });
        }

        let row = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            UPDATE records
               SET record_type = $2, title = $3, description = $4, amount = $5,
                   date = $6, created_at = $7, updated_at = $8
             WHERE id = $1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id.as_str())
        .bind(update.record_type.number())
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.amount)
        .bind(&update.date)
        .bind(update.created_at)
        .bind(now_seconds())
        .fetch_one(&mut *tx)
        .await
        .context("update record")?;

        tx.commit().await.context("commit tx")?;
        Ok(Record::try_from(row)?)
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<(), StoreError> {
        let res = sqlx::query(r#"DELETE FROM records WHERE id = $1"#)
            .bind(id.as_str())
            .execute(&self.db)
            .await
            .context("delete record")?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn list_by_owner_and_type(
        &self,
        owner: &OwnerId,
        record_type: RecordType,
        page: PageRequest,
    ) -> Result<Page<Record>, StoreError> {
        let rows = sqlx::query_as::<_, RecordRow>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
              FROM records
             WHERE owner_id = $1 AND record_type = $2
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4
            "#
        ))
        .bind(owner.as_str())
        .bind(record_type.number())
        .bind(page.fetch_limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.db)
        .await
        .context("list records by owner and type")?;

        debug!(%owner, %record_type, rows = rows.len(), "records fetched");
        let records = rows
            .into_iter()
            .map(Record::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Page::from_overfetch(records, page))
    }
}

/// Runs against a real Postgres when `DATABASE_URL` is set; skipped otherwise.
#[cfg(test)]
mod pg_tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    async fn store() -> Option<PgRecordStore> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL missing; skipping postgres store tests");
            return None;
        };
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        Some(PgRecordStore::new(pool))
    }

    // Fresh owner per test so runs against a shared database stay isolated.
    fn fresh_owner() -> OwnerId {
        OwnerId::parse(RecordId::generate().as_str()).unwrap()
    }

    fn new_record(owner_id: OwnerId, created_at: OffsetDateTime) -> NewRecord {
        NewRecord {
            owner_id,
            record_type: RecordType::Income,
            title: "salary".into(),
            description: String::new(),
            amount: 500_000,
            date: "2024-01-31".into(),
            created_at,
        }
    }

    fn update_for(owner_id: OwnerId, created_at: OffsetDateTime) -> RecordUpdate {
        RecordUpdate {
            owner_id,
            record_type: RecordType::Expense,
            title: "rent".into(),
            description: "march".into(),
            amount: 90_000,
            date: "2024-03-01".into(),
            created_at,
        }
    }

    #[tokio::test]
    async fn update_checks_owner_under_row_lock() {
        let Some(store) = store().await else { return };
        let owner = fresh_owner();
        let created_at = datetime!(2024-01-31 12:00 UTC);
        let rec = store.insert(new_record(owner.clone(), created_at)).await.unwrap();

        let err = store
            .update_by_id(&rec.id, update_for(fresh_owner(), created_at))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OwnerMismatch { .. }));

        let page = store
            .list_by_owner_and_type(&owner, RecordType::Income, PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.items, vec![rec.clone()]);

        let updated = store
            .update_by_id(&rec.id, update_for(owner.clone(), created_at))
            .await
            .unwrap();
        assert_eq!(updated.title, "rent");
        assert_eq!(updated.record_type, RecordType::Expense);
        assert_eq!(updated.owner_id, owner);
        assert_eq!(updated.created_at, created_at);
        assert!(updated.updated_at >= updated.created_at);

        store.delete_by_id(&rec.id).await.unwrap();
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let Some(store) = store().await else { return };
        let id = RecordId::generate();

        let err = store
            .update_by_id(&id, update_for(fresh_owner(), datetime!(2024-01-31 12:00 UTC)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref missing) if missing == &id));

        let rec = store
            .insert(new_record(fresh_owner(), datetime!(2024-01-31 12:00 UTC)))
            .await
            .unwrap();
        store.delete_by_id(&rec.id).await.unwrap();
        let err = store.delete_by_id(&rec.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_next_page() {
        let Some(store) = store().await else { return };
        let owner = fresh_owner();
        let base = datetime!(2024-01-01 0:00 UTC);
        let mut ids = Vec::new();
        for day in 0..3 {
            let rec = store
                .insert(new_record(owner.clone(), base + Duration::days(day)))
                .await
                .unwrap();
            ids.push(rec.id);
        }
        let mut other_type = new_record(owner.clone(), base);
        other_type.record_type = RecordType::Expense;
        let expense = store.insert(other_type).await.unwrap();

        let first = store
            .list_by_owner_and_type(&owner, RecordType::Income, PageRequest::new(0, 2))
            .await
            .unwrap();
        let first_ids: Vec<_> = first.items.iter().map(|r| r.id.clone()).collect();
        assert_eq!(first_ids, vec![ids[2].clone(), ids[1].clone()]);
        assert_eq!(first.next_page, Some(1));

        let second = store
            .list_by_owner_and_type(&owner, RecordType::Income, PageRequest::new(1, 2))
            .await
            .unwrap();
        let second_ids: Vec<_> = second.items.iter().map(|r| r.id.clone()).collect();
        assert_eq!(second_ids, vec![ids[0].clone()]);
        assert_eq!(second.next_page, None);

        for id in ids.iter().chain(std::iter::once(&expense.id)) {
            store.delete_by_id(id).await.unwrap();
        }
    }
}
