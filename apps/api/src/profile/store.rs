//! Persistence seam for profile collections.
//!
//! Every write replaces one whole column and is guarded by the row `version`:
//! the UPDATE only lands if nobody else wrote the row since it was read.
//! `AppState` carries an `Arc<dyn ProfileStore>`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::profile::collections::{FieldWrite, ProfileCollections};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, user_id: i64) -> Result<Option<ProfileCollections>, AppError>;

    /// Inserts an empty profile row unless one exists.
    async fn create_if_absent(&self, user_id: i64) -> Result<(), AppError>;

    /// Writes `write` only if the row is still at `expected_version`.
    /// Returns `false` when another writer got there first.
    async fn compare_and_set(
        &self,
        user_id: i64,
        expected_version: i64,
        write: FieldWrite,
    ) -> Result<bool, AppError>;
}

#[derive(FromRow)]
struct CollectionsRow {
    version: i64,
    bookmarked_exams: Option<Json<Vec<i64>>>,
    shortlisted_colleges: Option<Json<Vec<i64>>>,
    exam_scores: Option<Json<Map<String, Value>>>,
}

impl From<CollectionsRow> for ProfileCollections {
    fn from(row: CollectionsRow) -> Self {
        ProfileCollections {
            version: row.version,
            bookmarked_exams: row.bookmarked_exams.map(|j| j.0),
            shortlisted_colleges: row.shortlisted_colleges.map(|j| j.0),
            exam_scores: row.exam_scores.map(|j| j.0),
        }
    }
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load(&self, user_id: i64) -> Result<Option<ProfileCollections>, AppError> {
        let row: Option<CollectionsRow> = sqlx::query_as(
            r#"
            SELECT version, bookmarked_exams, shortlisted_colleges, exam_scores
            FROM user_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create_if_absent(&self, user_id: i64) -> Result<(), AppError> {
        sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::not_found_on_foreign_key(e, "User not found"))?;
        Ok(())
    }

    async fn compare_and_set(
        &self,
        user_id: i64,
        expected_version: i64,
        write: FieldWrite,
    ) -> Result<bool, AppError> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "UPDATE user_profiles \
             SET {} = $1, version = version + 1, updated_at = NOW() \
             WHERE user_id = $2 AND version = $3",
            write.column()
        );
        let query = match write {
            FieldWrite::Members(_, ids) => sqlx::query(&sql).bind(Json(ids)),
            FieldWrite::ExamScores(scores) => sqlx::query(&sql).bind(Json(scores)),
        };
        let result = query
            .bind(user_id)
            .bind(expected_version)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-process store that yields between read and write so concurrent
    //! callers genuinely interleave on a single-threaded runtime.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::profile::collections::MemberCollection;

    #[derive(Default)]
    pub struct MemoryProfileStore {
        rows: Mutex<HashMap<i64, ProfileCollections>>,
        pub lost_writes: AtomicUsize,
    }

    impl MemoryProfileStore {
        pub fn snapshot(&self, user_id: i64) -> Option<ProfileCollections> {
            self.rows.lock().unwrap().get(&user_id).cloned()
        }
    }

    fn apply(write: FieldWrite, profile: &mut ProfileCollections) {
        match write {
            FieldWrite::Members(MemberCollection::Bookmarks, ids) => {
                profile.bookmarked_exams = Some(ids)
            }
            FieldWrite::Members(MemberCollection::Shortlist, ids) => {
                profile.shortlisted_colleges = Some(ids)
            }
            FieldWrite::ExamScores(scores) => profile.exam_scores = Some(scores),
        }
    }

    #[async_trait]
    impl ProfileStore for MemoryProfileStore {
        async fn load(&self, user_id: i64) -> Result<Option<ProfileCollections>, AppError> {
            let row = self.rows.lock().unwrap().get(&user_id).cloned();
            tokio::task::yield_now().await;
            Ok(row)
        }

        async fn create_if_absent(&self, user_id: i64) -> Result<(), AppError> {
            self.rows.lock().unwrap().entry(user_id).or_default();
            Ok(())
        }

        async fn compare_and_set(
            &self,
            user_id: i64,
            expected_version: i64,
            write: FieldWrite,
        ) -> Result<bool, AppError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&user_id) {
                Some(row) if row.version == expected_version => {
                    apply(write, row);
                    row.version += 1;
                    Ok(true)
                }
                _ => {
                    self.lost_writes.fetch_add(1, Ordering::SeqCst);
                    Ok(false)
                }
            }
        }
    }

    /// A store where every conditional write loses.
    pub struct AlwaysStale;

    #[async_trait]
    impl ProfileStore for AlwaysStale {
        async fn load(&self, _user_id: i64) -> Result<Option<ProfileCollections>, AppError> {
            Ok(Some(ProfileCollections::default()))
        }

        async fn create_if_absent(&self, _user_id: i64) -> Result<(), AppError> {
            Ok(())
        }

        async fn compare_and_set(
            &self,
            _user_id: i64,
            _expected_version: i64,
            _write: FieldWrite,
        ) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    /// A store for an account deleted while its token is still valid: the
    /// profile insert fails on the users foreign key.
    pub struct DeletedAccount;

    #[async_trait]
    impl ProfileStore for DeletedAccount {
        async fn load(&self, _user_id: i64) -> Result<Option<ProfileCollections>, AppError> {
            Ok(None)
        }

        async fn create_if_absent(&self, _user_id: i64) -> Result<(), AppError> {
            Err(AppError::NotFound("User not found".into()))
        }

        async fn compare_and_set(
            &self,
            _user_id: i64,
            _expected_version: i64,
            _write: FieldWrite,
        ) -> Result<bool, AppError> {
            Ok(false)
        }
    }
}
