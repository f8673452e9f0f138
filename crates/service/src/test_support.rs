#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use uuid::Uuid;

use models::db::connect;
use models::user::{self, NewUser, Role};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Fresh connection to a migrated database, or `None` when DB tests should be skipped.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let ready = MIGRATED
        .get_or_init(|| async {
            let Ok(db) = connect().await else {
                eprintln!("skip: database unreachable");
                return false;
            };
            migration::Migrator::up(&db, None).await.is_ok()
        })
        .await;
    if !*ready {
        return None;
    }
    // Return a fresh connection for the current test's runtime
    connect().await.ok()
}

pub async fn seed_user(db: &DatabaseConnection, tag: &str, role: Role) -> user::Model {
    let suffix = Uuid::new_v4().simple().to_string();
    let input = NewUser {
        email: format!("{tag}_{suffix}@example.com"),
        username: format!("{tag}_{}", &suffix[..12]),
        display_name: format!("{tag} user"),
        role,
    };
    user::create(db, &input).await.expect("seed user")
}
