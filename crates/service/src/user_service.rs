use chrono::Utc;
use common::pagination::{Page, PageQuery};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::user::{self, Role};
use crate::auth::domain::{AuthUser, RegisterInput};
use crate::auth::repository::AuthRepository;
use crate::auth::{Actor, AuthService};
use crate::errors::ServiceError;
use crate::pagination::{fetch_page, to_order};

/// Sortable user columns keyed by their `orderBy` name.
pub const USER_SORT_KEYS: [(&str, user::Column); 5] = [
    ("email", user::Column::Email),
    ("username", user::Column::Username),
    ("display_name", user::Column::DisplayName),
    ("role", user::Column::Role),
    ("created_at", user::Column::CreatedAt),
];

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

/// List users page by page (admin only).
#[instrument(skip(db, query), fields(actor = %actor.user_id))]
pub async fn list_users(db: &DatabaseConnection, actor: Actor, query: &PageQuery) -> Result<Page<user::Model>, ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::forbidden("list users"));
    }
    let column = query.resolve_sort(&USER_SORT_KEYS, user::Column::CreatedAt)?;
    let select = user::Entity::find()
        .order_by(column, to_order(query.order))
        .order_by(user::Column::Id, to_order(query.order));
    fetch_page(db, select, query).await
}

/// Get a user by id (self or admin).
pub async fn get_user(db: &DatabaseConnection, actor: Actor, id: Uuid) -> Result<user::Model, ServiceError> {
    if !actor.can_access(id) {
        return Err(ServiceError::forbidden("view this user"));
    }
    user::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("user"))
}

/// Create a user with credentials on behalf of an admin.
pub async fn create_user<R: AuthRepository>(
    auth: &AuthService<R>,
    actor: Actor,
    input: RegisterInput,
    role: Role,
) -> Result<AuthUser, ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::forbidden("create users"));
    }
    Ok(auth.create_user(input, role).await?)
}

/// Update profile fields (self or admin); only admins may change roles.
#[instrument(skip(db, input), fields(actor = %actor.user_id, user_id = %id))]
pub async fn update_user(db: &DatabaseConnection, actor: Actor, id: Uuid, input: UpdateUserInput) -> Result<user::Model, ServiceError> {
    let existing = get_user(db, actor, id).await?;
    if let Some(role) = input.role {
        if role != existing.role() && !actor.is_admin() {
            return Err(ServiceError::forbidden("change roles"));
        }
    }

    let mut am: user::ActiveModel = existing.into();
    if let Some(email) = input.email {
        user::validate_email(&email)?;
        am.email = Set(email.trim().to_lowercase());
    }
    if let Some(username) = input.username {
        user::validate_username(&username)?;
        am.username = Set(username);
    }
    if let Some(name) = input.display_name {
        user::validate_display_name(&name)?;
        am.display_name = Set(name.trim().to_string());
    }
    if let Some(role) = input.role {
        am.role = Set(role.as_str().to_string());
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    Ok(updated)
}

/// Hard-delete a user (admin only); credentials and schedules cascade.
#[instrument(skip(db), fields(actor = %actor.user_id, user_id = %id))]
pub async fn delete_user(db: &DatabaseConnection, actor: Actor, id: Uuid) -> Result<(), ServiceError> {
    if !actor.is_admin() {
        return Err(ServiceError::forbidden("delete users"));
    }
    if !user::hard_delete(db, id).await? {
        return Err(ServiceError::not_found("user"));
    }
    info!(user_id = %id, "user_deleted");
    Ok(())
}
