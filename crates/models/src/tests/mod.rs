
/// Constraint enforcement: uniqueness, foreign keys, cascades, transactions
pub mod constraint_tests;

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

use crate::db::connect;

static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Connect and migrate once per process; `None` means the test should be skipped.
pub(crate) async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = MIGRATED
        .get_or_init(|| async {
            match connect().await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => { eprintln!("skip: migrate up failed: {}", e); false }
                },
                Err(e) => { eprintln!("skip: cannot connect to db: {}", e); false }
            }
        })
        .await;
    if !*migrated {
        return None;
    }
    connect().await.ok()
}
