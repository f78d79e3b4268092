mod common;

use alumni::services::email::EmailService;
use alumni::services::notification::NotificationService;
use alumni::services::reminder::send_event_reminders;
use alumni::websocket::hub::NotificationHub;
use serde_json::Value;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn reminders_reach_registered_members_of_tomorrows_events() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, going) = common::create_test_user(&app, "going").await;
    let (_b, cancelled) = common::create_test_user(&app, "cancelled").await;

    let resp = app
        .client
        .post(app.url("/admin/events"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": "Halal Bihalal",
            "description": "",
            "location": "Gedung Serbaguna",
            "event_date": common::days_from_now(1),
            "is_published": true
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let event_id = body["data"]["id"].as_i64().unwrap();
    // next week's event must not be reminded yet
    let later_id = common::create_event(&app, &admin_token, None).await;

    for token in [&going, &cancelled] {
        for id in [event_id, later_id] {
            app.client
                .post(app.url(&format!("/events/{}/register", id)))
                .bearer_auth(token)
                .send()
                .await
                .unwrap();
        }
    }
    app.client
        .post(app.url(&format!("/events/{}/cancel", event_id)))
        .bearer_auth(&cancelled)
        .send()
        .await
        .unwrap();

    let notifications = NotificationService::new(app.db.clone(), NotificationHub::new());
    let report = send_event_reminders(&app.db, &notifications, &EmailService::disabled())
        .await
        .unwrap();
    assert_eq!(report.events, 1);
    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&going)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["kind"], "event_reminder");
    assert!(body["data"]["items"][0]["actor_id"].is_null());
}
