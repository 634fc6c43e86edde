//! SQLite creature state store
//!
//! One row per `(user_id, group_id)` in `creature_state`; `group_id` is the
//! empty string for private/shared partitions. Currency lives in `wallet`,
//! keyed by the raw user id.
//!
//! The profile upsert never names the `turns` column, and `record_turn` only
//! ever runs `turns = turns + ?`, so the two writers cannot clobber each other.
//! `commit_turn` runs both inside one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::application::ports::outbound::{CreatureStatePort, StoreError};
use crate::domain::entities::{CreatureProfile, CreatureState, TurnReceipt};
use crate::domain::value_objects::{CreatureId, EmotionValues, PartitionKey};

const SELECT_STATE: &str = r#"
    SELECT user_id, group_id, current_id, courage, friendship, love, knowledge,
           turns, hatched_at, last_active_at
    FROM creature_state
"#;

#[derive(Debug, sqlx::FromRow)]
struct CreatureRow {
    user_id: String,
    group_id: String,
    current_id: String,
    courage: i64,
    friendship: i64,
    love: i64,
    knowledge: i64,
    turns: i64,
    hatched_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl CreatureRow {
    fn into_state(self) -> Result<CreatureState, StoreError> {
        let counter = |name: &str, value: i64| {
            u32::try_from(value).map_err(|_| {
                StoreError::Corrupt(format!("{} = {} for {}", name, value, self.user_id))
            })
        };

        let emotions = EmotionValues::new(
            counter("courage", self.courage)?,
            counter("friendship", self.friendship)?,
            counter("love", self.love)?,
            counter("knowledge", self.knowledge)?,
        );
        let turns = u64::try_from(self.turns)
            .map_err(|_| StoreError::Corrupt(format!("turns = {} for {}", self.turns, self.user_id)))?;
        let key = PartitionKey::from_columns(self.user_id.clone(), &self.group_id)
            .map_err(StoreError::Corrupt)?;

        Ok(CreatureState {
            key,
            current_id: CreatureId::new(self.current_id),
            emotions,
            turns,
            hatched_at: self.hatched_at,
            last_active_at: self.last_active_at,
        })
    }
}

/// Classify driver errors; lock contention and pool exhaustion are worth a retry
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        sqlx::Error::Database(db) if is_lock_contention(db.code().as_deref()) => {
            StoreError::Unavailable(e.to_string())
        }
        _ => StoreError::Database(e.to_string()),
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|code| code.parse::<i32>().ok())
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

fn to_column(value: u64, name: &str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Database(format!("{} out of range: {}", name, value)))
}

/// Profile upsert; never names the `turns` column
async fn upsert_profile(
    conn: &mut SqliteConnection,
    profile: &CreatureProfile,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO creature_state
            (user_id, group_id, current_id, courage, friendship, love, knowledge,
             hatched_at, last_active_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, group_id) DO UPDATE SET
            current_id = excluded.current_id,
            courage = excluded.courage,
            friendship = excluded.friendship,
            love = excluded.love,
            knowledge = excluded.knowledge,
            last_active_at = excluded.last_active_at
        "#,
    )
    .bind(profile.key.owner())
    .bind(profile.key.group_column())
    .bind(profile.current_id.as_str())
    .bind(profile.emotions.courage as i64)
    .bind(profile.emotions.friendship as i64)
    .bind(profile.emotions.love as i64)
    .bind(profile.emotions.knowledge as i64)
    .bind(profile.hatched_at)
    .bind(profile.last_active_at)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

/// Server-side `turns = turns + ?` plus the wallet credit; returns the new counter
async fn increment_turns(
    conn: &mut SqliteConnection,
    key: &PartitionKey,
    turns_delta: u64,
    currency: u64,
) -> Result<u64, StoreError> {
    let turns_delta = to_column(turns_delta, "turn delta")?;
    let credit = to_column(currency, "currency")?;

    let turns: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE creature_state SET turns = turns + ?
        WHERE user_id = ? AND group_id = ?
        RETURNING turns
        "#,
    )
    .bind(turns_delta)
    .bind(key.owner())
    .bind(key.group_column())
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    let Some((turns,)) = turns else {
        return Err(StoreError::NotFound(key.clone()));
    };

    if credit > 0 {
        sqlx::query(
            r#"
            INSERT INTO wallet (user_id, balance, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key.owner())
        .bind(credit)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;
    }

    u64::try_from(turns).map_err(|_| StoreError::Corrupt(format!("turns = {} for {}", turns, key)))
}

pub struct SqliteCreatureStore {
    pool: SqlitePool,
}

impl SqliteCreatureStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS creature_state (
                user_id TEXT NOT NULL,
                group_id TEXT NOT NULL DEFAULT '',
                current_id TEXT NOT NULL,
                courage INTEGER NOT NULL DEFAULT 0 CHECK (courage >= 0),
                friendship INTEGER NOT NULL DEFAULT 0 CHECK (friendship >= 0),
                love INTEGER NOT NULL DEFAULT 0 CHECK (love >= 0),
                knowledge INTEGER NOT NULL DEFAULT 0 CHECK (knowledge >= 0),
                turns INTEGER NOT NULL DEFAULT 0 CHECK (turns >= 0),
                hatched_at TEXT NOT NULL,
                last_active_at TEXT NOT NULL,
                PRIMARY KEY (user_id, group_id)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet (
                user_id TEXT PRIMARY KEY,
                balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    async fn fetch(&self, key: &PartitionKey) -> Result<Option<CreatureState>, StoreError> {
        let row: Option<CreatureRow> =
            sqlx::query_as(&format!("{} WHERE user_id = ? AND group_id = ?", SELECT_STATE))
                .bind(key.owner())
                .bind(key.group_column())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(CreatureRow::into_state).transpose()
    }
}

#[async_trait]
impl CreatureStatePort for SqliteCreatureStore {
    async fn get_or_create(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError> {
        let now = Utc::now();
        let inserted = sqlx::query(
            r#"
            INSERT INTO creature_state (user_id, group_id, current_id, hatched_at, last_active_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, group_id) DO NOTHING
            "#,
        )
        .bind(key.owner())
        .bind(key.group_column())
        .bind(default_id.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if inserted.rows_affected() == 1 {
            tracing::debug!(partition = %key, creature = %default_id, "Hatched new creature");
        }

        self.fetch(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn get(&self, key: &PartitionKey) -> Result<Option<CreatureState>, StoreError> {
        self.fetch(key).await
    }

    async fn save(&self, profile: &CreatureProfile) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        upsert_profile(&mut conn, profile).await
    }

    async fn reset(
        &self,
        key: &PartitionKey,
        default_id: &CreatureId,
    ) -> Result<CreatureState, StoreError> {
        let fresh = CreatureState::hatch(key.clone(), default_id.clone());
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM creature_state WHERE user_id = ? AND group_id = ?")
            .bind(key.owner())
            .bind(key.group_column())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO creature_state (user_id, group_id, current_id, hatched_at, last_active_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(key.owner())
        .bind(key.group_column())
        .bind(default_id.as_str())
        .bind(fresh.hatched_at)
        .bind(fresh.last_active_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(fresh)
    }

    async fn update_current_id(
        &self,
        key: &PartitionKey,
        creature_id: &CreatureId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE creature_state SET current_id = ? WHERE user_id = ? AND group_id = ?",
        )
        .bind(creature_id.as_str())
        .bind(key.owner())
        .bind(key.group_column())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(key.clone()));
        }
        Ok(())
    }

    async fn record_turn(
        &self,
        key: &PartitionKey,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let turns = increment_turns(&mut tx, key, turns_delta, currency).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(TurnReceipt {
            turns,
            currency_credited: currency,
        })
    }

    async fn commit_turn(
        &self,
        profile: &CreatureProfile,
        turns_delta: u64,
        currency: u64,
    ) -> Result<TurnReceipt, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        upsert_profile(&mut tx, profile).await?;
        let turns = increment_turns(&mut tx, &profile.key, turns_delta, currency).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(TurnReceipt {
            turns,
            currency_credited: currency,
        })
    }

    async fn get_all(&self) -> Result<Vec<CreatureState>, StoreError> {
        let rows: Vec<CreatureRow> =
            sqlx::query_as(&format!("{} ORDER BY user_id, group_id", SELECT_STATE))
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter().map(CreatureRow::into_state).collect()
    }

    async fn balance(&self, owner: &str) -> Result<u64, StoreError> {
        let balance: Option<(i64,)> = sqlx::query_as("SELECT balance FROM wallet WHERE user_id = ?")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match balance {
            Some((balance,)) => u64::try_from(balance)
                .map_err(|_| StoreError::Corrupt(format!("balance = {} for {}", balance, owner))),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    use crate::domain::value_objects::GroupMode;

    async fn store() -> SqliteCreatureStore {
        // a single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        SqliteCreatureStore::new(pool).await.unwrap()
    }

    fn key(group: Option<i64>) -> PartitionKey {
        PartitionKey::resolve("1001", group, GroupMode::Separate)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = store().await;

        let first = store
            .get_or_create(&key(Some(5)), &CreatureId::new("botamon"))
            .await
            .unwrap();
        let second = store
            .get_or_create(&key(Some(5)), &CreatureId::new("punimon"))
            .await
            .unwrap();

        assert_eq!(first.current_id.as_str(), "botamon");
        assert_eq!(second.current_id.as_str(), "botamon");
        assert_eq!(first.key, second.key);
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_commute() {
        let store = Arc::new(store().await);
        store
            .get_or_create(&key(None), &CreatureId::new("botamon"))
            .await
            .unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.record_turn(&key(None), 5, 1).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.record_turn(&key(None), 7, 1).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let state = store.get(&key(None)).await.unwrap().unwrap();
        assert_eq!(state.turns, 12);
    }

    #[tokio::test]
    async fn test_profile_save_never_touches_counter() {
        let store = store().await;
        let stale = store
            .get_or_create(&key(Some(2)), &CreatureId::new("botamon"))
            .await
            .unwrap();

        let receipt = store.record_turn(&key(Some(2)), 1500, 150).await.unwrap();
        assert_eq!(receipt.turns, 1500);

        let mut profile = stale.profile();
        profile.emotions = EmotionValues::new(9, 8, 7, 6);
        profile.current_id = CreatureId::new("koromon");
        store.save(&profile).await.unwrap();

        let state = store.get(&key(Some(2))).await.unwrap().unwrap();
        assert_eq!(state.turns, 1500);
        assert_eq!(state.emotions, EmotionValues::new(9, 8, 7, 6));
        assert_eq!(state.current_id.as_str(), "koromon");
    }

    #[tokio::test]
    async fn test_wallet_is_shared_by_owner_partitions() {
        let store = store().await;
        for group in [Some(1), Some(2), None] {
            store
                .get_or_create(&key(group), &CreatureId::new("botamon"))
                .await
                .unwrap();
            store.record_turn(&key(group), 30, 3).await.unwrap();
        }
        store.record_turn(&key(None), 0, 0).await.unwrap();

        assert_eq!(store.balance("1001").await.unwrap(), 9);
        assert_eq!(store.balance("2002").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_recreates_zeroed_record() {
        let store = store().await;
        store
            .get_or_create(&key(None), &CreatureId::new("agumon"))
            .await
            .unwrap();
        store.record_turn(&key(None), 4000, 400).await.unwrap();
        let mut profile = store.get(&key(None)).await.unwrap().unwrap().profile();
        profile.emotions = EmotionValues::new(50, 50, 50, 50);
        store.save(&profile).await.unwrap();

        let fresh = store
            .reset(&key(None), &CreatureId::new("botamon"))
            .await
            .unwrap();
        assert_eq!(fresh.current_id.as_str(), "botamon");

        let state = store.get(&key(None)).await.unwrap().unwrap();
        assert_eq!(state.turns, 0);
        assert_eq!(state.emotions, EmotionValues::default());
        assert_eq!(state.current_id.as_str(), "botamon");
    }

    #[tokio::test]
    async fn test_commit_turn_writes_profile_and_counter_together() {
        let store = store().await;
        let mut profile = store
            .get_or_create(&key(Some(4)), &CreatureId::new("botamon"))
            .await
            .unwrap()
            .profile();
        store.record_turn(&key(Some(4)), 100, 10).await.unwrap();

        profile.emotions = EmotionValues::new(3, 0, 0, 1);
        let receipt = store.commit_turn(&profile, 250, 25).await.unwrap();
        assert_eq!(receipt.turns, 350);

        let state = store.get(&key(Some(4))).await.unwrap().unwrap();
        assert_eq!(state.turns, 350);
        assert_eq!(state.emotions, EmotionValues::new(3, 0, 0, 1));
        assert_eq!(store.balance("1001").await.unwrap(), 35);
    }

    #[tokio::test]
    async fn test_failed_commit_turn_rolls_back_profile() {
        let store = store().await;
        let mut profile = store
            .get_or_create(&key(None), &CreatureId::new("botamon"))
            .await
            .unwrap()
            .profile();

        // the counter half fails after the profile upsert already ran
        profile.emotions = EmotionValues::new(10, 0, 0, 0);
        let result = store.commit_turn(&profile, u64::MAX, 1).await;
        assert!(matches!(result, Err(StoreError::Database(_))));

        let state = store.get(&key(None)).await.unwrap().unwrap();
        assert_eq!(state.emotions, EmotionValues::default());
        assert_eq!(state.turns, 0);
        assert_eq!(store.balance("1001").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let store = store().await;
        assert!(store.get(&key(None)).await.unwrap().is_none());
        assert!(matches!(
            store.update_current_id(&key(None), &CreatureId::new("x")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.record_turn(&key(None), 10, 1).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.balance("1001").await.unwrap(), 0);
    }

    #[test]
    fn test_lock_contention_codes() {
        assert!(is_lock_contention(Some("5")));
        assert!(is_lock_contention(Some("517")));
        assert!(is_lock_contention(Some("6")));
        assert!(!is_lock_contention(Some("19")));
        assert!(!is_lock_contention(None));
    }
}
