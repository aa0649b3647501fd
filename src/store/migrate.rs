//! Schema migrations with a persisted ledger.
//!
//! Applied migration ids are recorded in the `_migrations` table. A
//! migration's statement and its ledger row commit in one transaction,
//! so re-running the same set applies nothing new and a crash between
//! migrations leaves the store at the last committed one.

use std::collections::HashSet;

use sqlx::PgPool;

use crate::store::connector::StoreError;

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    id TEXT PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// A named, idempotent schema change. Ids sort lexicographically, so the
/// convention is a zero-padded numeric prefix: `0001_initial`.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Select and order the migrations still to apply.
///
/// Pure so ordering and idempotence are testable without a database.
pub fn pending<'a>(
    set: &'a [Migration],
    applied: &HashSet<String>,
) -> Result<Vec<&'a Migration>, StoreError> {
    let mut seen = HashSet::new();
    for migration in set {
        if !seen.insert(migration.id) {
            return Err(StoreError::DuplicateMigration(migration.id.to_string()));
        }
    }

    let mut todo: Vec<&Migration> = set
        .iter()
        .filter(|m| !applied.contains(m.id))
        .collect();
    todo.sort_by_key(|m| m.id);
    Ok(todo)
}

/// Apply every pending migration in ascending id order.
pub async fn run(pool: &PgPool, set: &[Migration]) -> Result<u64, StoreError> {
    sqlx::query(LEDGER_DDL)
        .execute(pool)
        .await
        .map_err(StoreError::Ledger)?;

    let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM _migrations")
        .fetch_all(pool)
        .await
        .map_err(StoreError::Ledger)?;
    let applied: HashSet<String> = ids.into_iter().collect();

    let mut count = 0u64;
    for migration in pending(set, &applied)? {
        let mut tx = pool.begin().await.map_err(StoreError::Ledger)?;

        sqlx::query(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Migration {
                id: migration.id.to_string(),
                source: e,
            })?;
        sqlx::query("INSERT INTO _migrations (id) VALUES ($1)")
            .bind(migration.id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::Ledger)?;

        tx.commit().await.map_err(StoreError::Ledger)?;
        tracing::info!(id = migration.id, "applied migration");
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Migration = Migration {
        id: "0001_initial",
        up: "CREATE TABLE a (id INT)",
    };
    const B: Migration = Migration {
        id: "0002_index",
        up: "CREATE INDEX a_id ON a (id)",
    };

    #[test]
    fn test_pending_sorts_ascending() {
        let todo = pending(&[B, A], &HashSet::new()).unwrap();
        assert_eq!(
            todo.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec!["0001_initial", "0002_index"]
        );
    }

    #[test]
    fn test_pending_skips_applied() {
        let applied: HashSet<String> = ["0001_initial".to_string()].into_iter().collect();
        let todo = pending(&[A, B], &applied).unwrap();
        assert_eq!(todo.len(), 1);
        assert_eq!(todo[0].id, "0002_index");
    }

    #[test]
    fn test_fully_applied_set_is_empty() {
        // A second run over the same ledger applies zero changes.
        let applied: HashSet<String> = ["0001_initial".to_string(), "0002_index".to_string()]
            .into_iter()
            .collect();
        assert!(pending(&[A, B], &applied).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = pending(&[A, A], &HashSet::new()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateMigration(_)));
    }
}
