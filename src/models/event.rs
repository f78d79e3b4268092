use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    pub event_date: DateTime,
    pub registration_deadline: Option<DateTime>,
    /// `None` means unlimited.
    pub max_participants: Option<i32>,
    pub image_url: Option<String>,
    pub is_published: bool,
    pub created_by: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(has_many = "super::event_registration::Entity")]
    Registrations,
}

impl Related<super::event_registration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Registrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Registration closes at the deadline, or at the start of the event
    /// when no deadline was set.
    pub fn registration_closes_at(&self) -> DateTime {
        self.registration_deadline.unwrap_or(self.event_date)
    }

    pub fn is_registration_open(&self, now: DateTime) -> bool {
        now <= self.registration_closes_at() && now < self.event_date
    }

    pub fn has_started(&self, now: DateTime) -> bool {
        now >= self.event_date
    }

    pub fn is_full(&self, active_registrations: u64) -> bool {
        match self.max_participants {
            Some(max) => active_registrations >= max.max(0) as u64,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn event(deadline: Option<DateTime>, max: Option<i32>) -> Model {
        let date = NaiveDate::from_ymd_opt(2030, 6, 1)
            .and_then(|d| d.and_hms_opt(18, 0, 0))
            .unwrap();
        Model {
            id: 1,
            title: "Reuni Akbar".into(),
            description: String::new(),
            location: "Aula".into(),
            event_date: date,
            registration_deadline: deadline,
            max_participants: max,
            image_url: None,
            is_published: true,
            created_by: 1,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn registration_closes_at_deadline() {
        let e = event(None, None);
        let deadline = e.event_date - Duration::days(3);
        let e = Model {
            registration_deadline: Some(deadline),
            ..e
        };
        assert!(e.is_registration_open(deadline));
        assert!(!e.is_registration_open(deadline + Duration::seconds(1)));
    }

    #[test]
    fn without_deadline_registration_closes_when_event_starts() {
        let e = event(None, None);
        assert!(e.is_registration_open(e.event_date - Duration::minutes(1)));
        assert!(!e.is_registration_open(e.event_date));
    }

    #[test]
    fn event_has_started_from_its_start_time() {
        let e = event(None, None);
        assert!(!e.has_started(e.event_date - Duration::seconds(1)));
        assert!(e.has_started(e.event_date));
        assert!(e.has_started(e.event_date + Duration::hours(2)));
    }

    #[test]
    fn capacity() {
        assert!(!event(None, None).is_full(10_000));
        assert!(!event(None, Some(2)).is_full(1));
        assert!(event(None, Some(2)).is_full(2));
        assert!(event(None, Some(0)).is_full(0));
    }
}
