use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

use super::crud_tests::new_user;
use super::setup_test_db;
use crate::errors::ModelError;
use crate::schedule::{self, NewSchedule, ScheduleStatus};
use crate::{user, user_credentials};

fn one_hour(owner_id: Uuid) -> NewSchedule {
    let start = Utc::now().fixed_offset();
    NewSchedule {
        owner_id,
        title: "Slot".into(),
        description: None,
        starts_at: start,
        ends_at: start + Duration::hours(1),
        status: ScheduleStatus::Planned,
    }
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let first = new_user("dup");
    let u = user::create(&db, &first).await?;
    let mut second = new_user("dup");
    second.email = first.email.clone();
    match user::create(&db, &second).await {
        Err(ModelError::Conflict(_)) => {}
        other => panic!("expected conflict, got {:?}", other),
    }

    user::hard_delete(&db, u.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_schedule_requires_existing_owner() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let res = schedule::create(&db, &one_hour(Uuid::new_v4())).await;
    assert!(matches!(res, Err(ModelError::Validation(_))), "got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn test_deleting_user_cascades() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let u = user::create(&db, &new_user("cascade")).await?;
    user_credentials::upsert_password(&db, u.id, "hash".into(), "argon2").await?;
    let s = schedule::create(&db, &one_hour(u.id)).await?;

    user::hard_delete(&db, u.id).await?;
    assert!(schedule::Entity::find_by_id(s.id).one(&db).await?.is_none());
    assert!(user_credentials::find_by_user(&db, u.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rollback_discards_user_and_credentials() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let txn = db.begin().await?;
    let u = user::create(&txn, &new_user("txn")).await?;
    user_credentials::upsert_password(&txn, u.id, "hash".into(), "argon2").await?;
    txn.rollback().await?;

    assert!(user::Entity::find_by_id(u.id).one(&db).await?.is_none());
    Ok(())
}
