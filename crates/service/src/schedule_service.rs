use chrono::Utc;
use common::pagination::{Page, PageQuery};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::schedule::{self, NewSchedule, ScheduleStatus};
use sea_orm::prelude::DateTimeWithTimeZone;
use crate::auth::Actor;
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, to_order};

/// Sortable schedule columns keyed by their `orderBy` name.
pub const SCHEDULE_SORT_KEYS: [(&str, schedule::Column); 5] = [
    ("title", schedule::Column::Title),
    ("starts_at", schedule::Column::StartsAt),
    ("ends_at", schedule::Column::EndsAt),
    ("status", schedule::Column::Status),
    ("created_at", schedule::Column::CreatedAt),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleInput {
    /// Only honoured for admins; defaults to the caller.
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: DateTimeWithTimeZone,
    #[serde(default)]
    pub status: Option<ScheduleStatus>,
}

/// Partial update; an empty `description` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateScheduleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTimeWithTimeZone>,
    pub ends_at: Option<DateTimeWithTimeZone>,
    pub status: Option<ScheduleStatus>,
}

/// List schedules visible to `actor`, optionally narrowed to one owner.
#[instrument(skip(db, query), fields(actor = %actor.user_id))]
pub async fn list_schedules(
    db: &DatabaseConnection,
    actor: Actor,
    owner_id: Option<Uuid>,
    query: &PageQuery,
) -> Result<Page<schedule::Model>, ServiceError> {
    let owner = match owner_id {
        Some(id) if !actor.can_access(id) => return Err(ServiceError::forbidden("list other users' schedules")),
        Some(id) => Some(id),
        None if actor.is_admin() => None,
        None => Some(actor.user_id),
    };
    let column = query.resolve_sort(&SCHEDULE_SORT_KEYS, schedule::Column::StartsAt)?;
    let mut select = schedule::Entity::find();
    if let Some(owner) = owner {
        select = select.filter(schedule::Column::OwnerId.eq(owner));
    }
    let select = select
        .order_by(column, to_order(query.order))
        .order_by(schedule::Column::Id, to_order(query.order));
    fetch_page(db, select, query).await
}

/// Get a schedule by id (owner or admin).
pub async fn get_schedule(db: &DatabaseConnection, actor: Actor, id: Uuid) -> Result<schedule::Model, ServiceError> {
    let found = schedule::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("schedule"))?;
    if !actor.can_access(found.owner_id) {
        return Err(ServiceError::forbidden("access this schedule"));
    }
    Ok(found)
}

#[instrument(skip(db, input), fields(actor = %actor.user_id))]
pub async fn create_schedule(db: &DatabaseConnection, actor: Actor, input: CreateScheduleInput) -> Result<schedule::Model, ServiceError> {
    let owner_id = input.owner_id.unwrap_or(actor.user_id);
    if !actor.can_access(owner_id) {
        return Err(ServiceError::forbidden("create schedules for other users"));
    }
    let created = schedule::create(db, &NewSchedule {
        owner_id,
        title: input.title,
        description: input.description,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        status: input.status.unwrap_or_default(),
    })
    .await?;
    info!(schedule_id = %created.id, owner_id = %owner_id, "schedule_created");
    Ok(created)
}

#[instrument(skip(db, input), fields(actor = %actor.user_id, schedule_id = %id))]
pub async fn update_schedule(db: &DatabaseConnection, actor: Actor, id: Uuid, input: UpdateScheduleInput) -> Result<schedule::Model, ServiceError> {
    let existing = get_schedule(db, actor, id).await?;
    let starts_at = input.starts_at.unwrap_or(existing.starts_at);
    let ends_at = input.ends_at.unwrap_or(existing.ends_at);
    schedule::validate_window(&starts_at, &ends_at)?;

    let mut am: schedule::ActiveModel = existing.into();
    if let Some(title) = input.title {
        schedule::validate_title(&title)?;
        am.title = Set(title.trim().to_string());
    }
    if let Some(description) = input.description {
        let description = description.trim();
        am.description = Set((!description.is_empty()).then(|| description.to_string()));
    }
    if let Some(status) = input.status {
        am.status = Set(status.as_str().to_string());
    }
    am.starts_at = Set(starts_at);
    am.ends_at = Set(ends_at);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    Ok(updated)
}

#[instrument(skip(db), fields(actor = %actor.user_id, schedule_id = %id))]
pub async fn delete_schedule(db: &DatabaseConnection, actor: Actor, id: Uuid) -> Result<(), ServiceError> {
    let existing = get_schedule(db, actor, id).await?;
    existing.delete(db).await?;
    info!(schedule_id = %id, "schedule_deleted");
    Ok(())
}
