use crate::{
    error::AppResult,
    models::{event, event_registration, Event, EventModel, EventRegistration, RegistrationStatus, User},
    services::{
        email::{EmailService, ReminderMail},
        notification::{NotificationKind, NotificationService, NotificationTarget},
    },
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderReport {
    pub events: u64,
    pub sent: u64,
    pub failed: u64,
}

/// `[start, end)` of the UTC calendar day after `today`.
pub fn tomorrow_window(today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = (today + Duration::days(1)).and_time(chrono::NaiveTime::MIN);
    (start, start + Duration::days(1))
}

fn reminder_message(event: &EventModel) -> String {
    format!(
        "Pengingat: \"{}\" berlangsung besok, {} di {}",
        event.title,
        event.event_date.format("%H:%M"),
        event.location
    )
}

/// Notifies every `registered` member of tomorrow's published events and
/// mails them when SMTP is configured. A failure for one member, or for
/// loading one event's registrations, is counted and the sweep carries on.
pub async fn send_event_reminders(
    db: &DatabaseConnection,
    notifications: &NotificationService,
    email: &EmailService,
) -> AppResult<ReminderReport> {
    let (start, end) = tomorrow_window(chrono::Utc::now().date_naive());

    let events = Event::find()
        .filter(event::Column::IsPublished.eq(true))
        .filter(event::Column::EventDate.gte(start))
        .filter(event::Column::EventDate.lt(end))
        .order_by_asc(event::Column::EventDate)
        .all(db)
        .await?;

    let mut report = ReminderReport {
        events: events.len() as u64,
        ..Default::default()
    };

    for ev in &events {
        let registrations = match EventRegistration::find()
            .filter(event_registration::Column::EventId.eq(ev.id))
            .filter(event_registration::Column::Status.eq(RegistrationStatus::Registered))
            .find_also_related(User)
            .all(db)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(event_id = ev.id, "Failed to load registrations: {}", e);
                report.failed += 1;
                continue;
            }
        };

        let message = reminder_message(ev);
        let starts_at = ev.event_date.format("%d-%m-%Y %H:%M").to_string();

        for (registration, member) in registrations {
            let Some(member) = member else {
                report.failed += 1;
                continue;
            };

            if let Err(e) = notifications
                .notify(
                    member.id,
                    None,
                    NotificationKind::EventReminder,
                    NotificationTarget::event(ev.id),
                    &message,
                )
                .await
            {
                tracing::warn!(
                    event_id = ev.id,
                    registration_id = registration.id,
                    "Failed to create reminder notification: {}",
                    e
                );
                report.failed += 1;
                continue;
            }

            if email.is_configured() {
                let mail = ReminderMail {
                    recipient_name: &member.full_name,
                    event_id: ev.id,
                    event_title: &ev.title,
                    location: &ev.location,
                    starts_at: &starts_at,
                };
                if let Err(e) = email.send_event_reminder(&member.email, &mail).await {
                    tracing::warn!(
                        event_id = ev.id,
                        user_id = member.id,
                        "Failed to send reminder email: {}",
                        e
                    );
                    report.failed += 1;
                    continue;
                }
            }

            report.sent += 1;
        }
    }

    tracing::info!(
        events = report.events,
        sent = report.sent,
        failed = report.failed,
        "Event reminders processed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::NotificationHub;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn event_at(id: i32, date: NaiveDateTime) -> EventModel {
        EventModel {
            id,
            title: "Temu Kangen".into(),
            description: String::new(),
            location: "Aula Utama".into(),
            event_date: date,
            registration_deadline: None,
            max_participants: None,
            image_url: None,
            is_published: true,
            created_by: 1,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn window_covers_exactly_the_next_day() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let (start, end) = tomorrow_window(today);
        assert_eq!(start.to_string(), "2027-01-01 00:00:00");
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn message_mentions_time_and_place() {
        let date = NaiveDate::from_ymd_opt(2030, 6, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        let ev = event_at(3, date);
        let msg = reminder_message(&ev);
        assert!(msg.contains("09:30"));
        assert!(msg.contains("Aula Utama"));
    }

    #[tokio::test]
    async fn failed_registration_lookup_skips_only_that_event() {
        let (start, _) = tomorrow_window(chrono::Utc::now().date_naive());
        let at = start + Duration::hours(10);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![event_at(1, at), event_at(2, at)]])
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .append_query_results([Vec::<event_registration::Model>::new()])
            .into_connection();
        let notifications = NotificationService::new(db.clone(), NotificationHub::new());

        let report = send_event_reminders(&db, &notifications, &EmailService::disabled())
            .await
            .unwrap();

        assert_eq!(
            report,
            ReminderReport {
                events: 2,
                sent: 0,
                failed: 1
            }
        );
    }
}
