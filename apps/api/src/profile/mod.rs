//! Bookmarks, shortlist and exam scores kept on the profile row. Membership
//! writes are idempotent; every write is a read-modify-write retried on
//! version conflicts.

pub mod collections;
pub mod handlers;
pub mod store;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::AppError;

pub use self::collections::MemberCollection;
use self::collections::{insert_member, remove_member as drop_member, FieldWrite, ProfileCollections};
pub use self::store::{PgProfileStore, ProfileStore};

/// Attempts per write before giving up with `Conflict`.
pub const MAX_WRITE_ATTEMPTS: usize = 16;

enum Step<R> {
    /// Nothing to persist.
    Done(R),
    Write(FieldWrite, R),
}

async fn read_modify_write<R, F>(
    store: &dyn ProfileStore,
    user_id: i64,
    create_missing: bool,
    mut step: F,
) -> Result<R, AppError>
where
    R: Send,
    F: FnMut(ProfileCollections) -> Result<Step<R>, AppError> + Send,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let profile = match store.load(user_id).await? {
            Some(profile) => profile,
            None if create_missing => {
                store.create_if_absent(user_id).await?;
                continue;
            }
            None => return Err(AppError::NotFound(format!("Profile for user {user_id} not found"))),
        };

        let version = profile.version;
        let (write, result) = match step(profile)? {
            Step::Done(result) => return Ok(result),
            Step::Write(write, result) => (write, result),
        };

        let column = write.column();
        if store.compare_and_set(user_id, version, write).await? {
            debug!("Profile {user_id}: wrote {column} at version {}", version + 1);
            return Ok(result);
        }
        warn!("Profile {user_id}: concurrent write to {column} (attempt {attempt}), retrying");
    }

    Err(AppError::Conflict(format!(
        "Profile for user {user_id} is being modified concurrently; try again"
    )))
}

/// Adds `item` to the collection, creating the profile on demand. Returns the
/// resulting collection; adding an existing member changes nothing.
pub async fn add_member(
    store: &dyn ProfileStore,
    user_id: i64,
    collection: MemberCollection,
    item: i64,
) -> Result<Vec<i64>, AppError> {
    read_modify_write(store, user_id, true, |profile| {
        let mut members = collection.read(&profile).cloned().unwrap_or_default();
        if insert_member(&mut members, item) {
            Ok(Step::Write(FieldWrite::Members(collection, members.clone()), members))
        } else {
            Ok(Step::Done(members))
        }
    })
    .await
}

/// Removes `item`. A missing profile or a never-written collection is
/// `NotFound`; removing an absent member returns the collection unchanged.
pub async fn remove_member(
    store: &dyn ProfileStore,
    user_id: i64,
    collection: MemberCollection,
    item: i64,
) -> Result<Vec<i64>, AppError> {
    read_modify_write(store, user_id, false, |profile| {
        let mut members = collection
            .read(&profile)
            .cloned()
            .ok_or_else(|| AppError::NotFound(collection.empty_message().to_string()))?;
        if drop_member(&mut members, item) {
            Ok(Step::Write(FieldWrite::Members(collection, members.clone()), members))
        } else {
            Ok(Step::Done(members))
        }
    })
    .await
    .map_err(|err| match err {
        AppError::NotFound(_) => AppError::NotFound(collection.empty_message().to_string()),
        other => other,
    })
}

pub async fn members(
    store: &dyn ProfileStore,
    user_id: i64,
    collection: MemberCollection,
) -> Result<Vec<i64>, AppError> {
    let profile = store.load(user_id).await?;
    Ok(profile
        .and_then(|p| collection.read(&p).cloned())
        .unwrap_or_default())
}

/// Replaces the score payload for one exam, leaving the others untouched.
pub async fn set_exam_score(
    store: &dyn ProfileStore,
    user_id: i64,
    exam_name: &str,
    payload: Value,
) -> Result<Map<String, Value>, AppError> {
    read_modify_write(store, user_id, true, |profile| {
        let mut scores = profile.exam_scores.unwrap_or_default();
        scores.insert(exam_name.to_string(), payload.clone());
        Ok(Step::Write(FieldWrite::ExamScores(scores.clone()), scores))
    })
    .await
}

pub async fn exam_scores(
    store: &dyn ProfileStore,
    user_id: i64,
) -> Result<Map<String, Value>, AppError> {
    let profile = store.load(user_id).await?;
    Ok(profile.and_then(|p| p.exam_scores).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use serde_json::json;
    use tokio::task::JoinSet;

    use super::store::memory::{AlwaysStale, DeletedAccount, MemoryProfileStore};
    use super::*;

    const USER: i64 = 42;

    #[tokio::test]
    async fn test_add_creates_profile_and_is_idempotent() {
        let store = MemoryProfileStore::default();
        let once = add_member(&store, USER, MemberCollection::Bookmarks, 3).await.unwrap();
        let twice = add_member(&store, USER, MemberCollection::Bookmarks, 3).await.unwrap();
        assert_eq!(once, [3]);
        assert_eq!(twice, once);
        // the duplicate add did not write
        assert_eq!(store.snapshot(USER).unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_add_then_read_round_trips() {
        let store = MemoryProfileStore::default();
        add_member(&store, USER, MemberCollection::Shortlist, 4).await.unwrap();
        add_member(&store, USER, MemberCollection::Shortlist, 1).await.unwrap();
        let read = members(&store, USER, MemberCollection::Shortlist).await.unwrap();
        assert_eq!(read, [4, 1]);
        // other collection untouched
        assert!(members(&store, USER, MemberCollection::Bookmarks)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_without_profile_is_not_found() {
        let store = MemoryProfileStore::default();
        let err = remove_member(&store, USER, MemberCollection::Shortlist, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "No shortlisted colleges found"));
    }

    #[tokio::test]
    async fn test_remove_from_unwritten_collection_is_not_found() {
        let store = MemoryProfileStore::default();
        add_member(&store, USER, MemberCollection::Bookmarks, 1).await.unwrap();
        let err = remove_member(&store, USER, MemberCollection::Shortlist, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_absent_member_returns_unchanged() {
        let store = MemoryProfileStore::default();
        add_member(&store, USER, MemberCollection::Shortlist, 4).await.unwrap();
        let out = remove_member(&store, USER, MemberCollection::Shortlist, 9)
            .await
            .unwrap();
        assert_eq!(out, [4]);
        let out = remove_member(&store, USER, MemberCollection::Shortlist, 4)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_set_exam_score_is_last_write_wins_per_exam() {
        let store = MemoryProfileStore::default();
        set_exam_score(&store, USER, "JEE Main", json!({ "rank": 5000 }))
            .await
            .unwrap();
        set_exam_score(&store, USER, "NEET UG", json!({ "rank": 900 }))
            .await
            .unwrap();
        let scores = set_exam_score(&store, USER, "JEE Main", json!({ "rank": 4200 }))
            .await
            .unwrap();
        assert_eq!(scores["JEE Main"]["rank"], 4200);
        assert_eq!(scores["NEET UG"]["rank"], 900);
        assert_eq!(exam_scores(&store, USER).await.unwrap(), scores);
    }

    #[tokio::test]
    async fn test_interleaved_adds_lose_nothing() {
        let store = Arc::new(MemoryProfileStore::default());
        add_member(store.as_ref(), USER, MemberCollection::Shortlist, 0)
            .await
            .unwrap();

        let mut tasks = JoinSet::new();
        for item in 1..=8 {
            let store = Arc::clone(&store);
            tasks.spawn(async move {
                add_member(store.as_ref(), USER, MemberCollection::Shortlist, item).await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let mut stored = members(store.as_ref(), USER, MemberCollection::Shortlist)
            .await
            .unwrap();
        stored.sort_unstable();
        assert_eq!(stored, (0..=8).collect::<Vec<i64>>());
        assert!(store.lost_writes.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_persistent_contention_surfaces_conflict() {
        let err = add_member(&AlwaysStale, USER, MemberCollection::Bookmarks, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_writes_for_deleted_account_are_not_found() {
        let err = add_member(&DeletedAccount, 987_654, MemberCollection::Bookmarks, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "User not found"));

        let err = set_exam_score(&DeletedAccount, 987_654, "JEE Main", json!(250))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
