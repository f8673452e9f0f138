use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: DateTimeWithTimeZone,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::OwnerId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Owner.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle state of a schedule entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    #[default]
    Planned,
    InProgress,
    Done,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Planned => "planned",
            ScheduleStatus::InProgress => "in_progress",
            ScheduleStatus::Done => "done",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ScheduleStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(ScheduleStatus::Planned),
            "in_progress" => Ok(ScheduleStatus::InProgress),
            "done" => Ok(ScheduleStatus::Done),
            "cancelled" => Ok(ScheduleStatus::Cancelled),
            other => Err(ModelError::Validation(format!("unknown schedule status: {other}"))),
        }
    }
}

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() { return Err(ModelError::Validation("title required".into())); }
    if title.chars().count() > 200 { return Err(ModelError::Validation("title too long (<=200)".into())); }
    Ok(())
}

pub fn validate_window(starts_at: &DateTimeWithTimeZone, ends_at: &DateTimeWithTimeZone) -> Result<(), ModelError> {
    if ends_at < starts_at {
        return Err(ModelError::Validation("ends_at must not be before starts_at".into()));
    }
    Ok(())
}

/// Fields required to insert a schedule.
#[derive(Clone, Debug)]
pub struct NewSchedule {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: DateTimeWithTimeZone,
    pub status: ScheduleStatus,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: &NewSchedule) -> Result<Model, ModelError> {
    validate_title(&input.title)?;
    validate_window(&input.starts_at, &input.ends_at)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(input.owner_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description.clone().filter(|d| !d.trim().is_empty())),
        starts_at: Set(input.starts_at),
        ends_at: Set(input.ends_at),
        status: Set(input.status.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn at(hour: u32) -> DateTimeWithTimeZone {
        FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn window_must_not_end_before_start() {
        assert!(validate_window(&at(9), &at(10)).is_ok());
        assert!(validate_window(&at(9), &at(9)).is_ok());
        assert!(validate_window(&at(10), &(at(10) - Duration::minutes(1))).is_err());
    }

    #[test]
    fn title_validation() {
        assert!(validate_title("Standup").is_ok());
        assert!(validate_title("  ").is_err());
        assert!(validate_title(&"t".repeat(201)).is_err());
    }

    #[test]
    fn status_parses_snake_case() {
        assert_eq!("in_progress".parse::<ScheduleStatus>().unwrap(), ScheduleStatus::InProgress);
        assert_eq!(ScheduleStatus::Cancelled.to_string(), "cancelled");
        assert!("paused".parse::<ScheduleStatus>().is_err());
    }
}
