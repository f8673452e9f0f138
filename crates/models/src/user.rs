use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::schedule;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Schedule,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Schedule => Entity::has_many(schedule::Entity).into() }
    }
}

impl Related<schedule::Entity> for Entity {
    fn to() -> RelationDef { Relation::Schedule.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ModelError::Validation(format!("unknown role: {other}"))),
        }
    }
}

impl Model {
    /// Stored role; unknown values degrade to `Role::User`.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid || email.len() > 255 { return Err(ModelError::Validation("invalid email".into())); }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    let len = username.chars().count();
    if !(3..=64).contains(&len) {
        return Err(ModelError::Validation("username must be 3 to 64 characters".into()));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return Err(ModelError::Validation("username may only contain letters, digits, '_', '.' and '-'".into()));
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("display name required".into())); }
    if name.chars().count() > 128 { return Err(ModelError::Validation("display name too long".into())); }
    Ok(())
}

/// Fields required to insert a user.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: &NewUser) -> Result<Model, ModelError> {
    validate_email(&input.email)?;
    validate_username(&input.username)?;
    validate_display_name(&input.display_name)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(input.email.trim().to_lowercase()),
        username: Set(input.username.clone()),
        display_name: Set(input.display_name.trim().to_string()),
        role: Set(input.role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?)
}

pub async fn find_by_username<C: ConnectionTrait>(db: &C, username: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Username.eq(username)).one(db).await?)
}

/// Removes the user; credentials and owned schedules cascade. Returns true if a row was deleted.
pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
