mod common;

use sea_orm::{ConnectionTrait, Statement};
use serde_json::Value;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn second_member_gets_conflict_when_event_is_full() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, first) = common::create_test_user(&app, "first").await;
    let (_b, second) = common::create_test_user(&app, "second").await;
    let event_id = common::create_event(&app, &admin_token, Some(1)).await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "registered");

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&second)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Event has reached its maximum number of participants"
    );

    let resp = app
        .client
        .get(app.url(&format!("/events/{}", event_id)))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["registered_count"], 1);
    assert_eq!(body["data"]["spots_left"], 0);
    assert_eq!(body["data"]["registration_open"], false);
    assert_eq!(body["data"]["my_registration"], "registered");
}

#[tokio::test]
#[serial]
async fn registering_twice_is_a_conflict() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let event_id = common::create_event(&app, &admin_token, None).await;

    let url = app.url(&format!("/events/{}/register", event_id));
    let resp = app.client.post(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.post(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "You are already registered for this event"
    );
}

#[tokio::test]
#[serial]
async fn cancel_then_register_again_reuses_the_row() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let event_id = common::create_event(&app, &admin_token, Some(5)).await;

    let register = app.url(&format!("/events/{}/register", event_id));
    let cancel = app.url(&format!("/events/{}/cancel", event_id));

    let resp = app.client.post(&register).bearer_auth(&token).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    let registration_id = body["data"]["id"].as_i64().unwrap();

    let resp = app.client.post(&cancel).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "cancelled");

    let resp = app.client.post(&register).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"].as_i64().unwrap(), registration_id);
    assert_eq!(body["data"]["status"], "registered");

    let resp = app
        .client
        .get(app.url(&format!("/admin/events/{}/registrations", event_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
#[serial]
async fn cancelling_without_registration_is_not_found() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let event_id = common::create_event(&app, &admin_token, None).await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/cancel", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[serial]
async fn drafts_are_hidden_from_members() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;

    let resp = app
        .client
        .post(app.url("/admin/events"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": "Draft",
            "description": "",
            "location": "Online",
            "event_date": common::days_from_now(3)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let event_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["is_published"], false);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .get(app.url(&format!("/events/{}", event_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
#[serial]
async fn admin_marks_attendance_and_member_is_notified() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let event_id = common::create_event(&app, &admin_token, None).await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let registration_id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .patch(app.url(&format!("/admin/registrations/{}", registration_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "status": "attended" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "attended");

    // attended is final
    let resp = app
        .client
        .patch(app.url(&format!("/admin/registrations/{}", registration_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // the member cannot undo it either
    let resp = app
        .client
        .post(app.url(&format!("/events/{}/cancel", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Cannot move registration from 'attended' to 'cancelled'"
    );

    let resp = app
        .client
        .get(app.url("/notifications/unread-count"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["count"], 1);

    let resp = app
        .client
        .get(app.url("/my/events"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["items"][0]["registration"]["status"], "attended");
}

#[tokio::test]
#[serial]
async fn members_cannot_manage_events() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_id, token) = common::create_test_user(&app, "member").await;

    let resp = app
        .client
        .post(app.url("/admin/events"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "title": "Nope",
            "description": "",
            "location": "Online",
            "event_date": common::days_from_now(3)
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn concurrent_registrations_never_overfill_an_event() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let event_id = common::create_event(&app, &admin_token, Some(1)).await;

    let mut tokens = Vec::new();
    for i in 0..10 {
        let (_id, token) = common::create_test_user(&app, &format!("rush{}", i)).await;
        tokens.push(token);
    }

    let url = app.url(&format!("/events/{}/register", event_id));
    let attempts = tokens.iter().map(|token| {
        let client = app.client.clone();
        let url = url.clone();
        let token = token.clone();
        tokio::spawn(async move {
            client
                .post(&url)
                .bearer_auth(&token)
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        })
    });

    let mut statuses = Vec::new();
    for handle in attempts.collect::<Vec<_>>() {
        statuses.push(handle.await.unwrap());
    }
    statuses.sort_unstable();
    assert_eq!(statuses[0], 200);
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1);
    assert!(statuses[1..].iter().all(|s| *s == 409));

    let resp = app
        .client
        .get(app.url(&format!("/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["registered_count"], 1);
    assert_eq!(body["data"]["spots_left"], 0);
}

#[tokio::test]
#[serial]
async fn registering_after_the_deadline_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "late").await;

    let resp = app
        .client
        .post(app.url("/admin/events"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "title": "Halal Bihalal",
            "description": "Silaturahmi angkatan",
            "location": "Gedung Serbaguna",
            "event_date": common::days_from_now(7),
            "registration_deadline": common::days_from_now(-1),
            "is_published": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let event_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["registration_open"], false);

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Registration for this event is closed");
}

#[tokio::test]
#[serial]
async fn cancelling_after_the_event_started_is_rejected() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let event_id = common::create_event(&app, &admin_token, None).await;

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    app.db
        .execute(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE events SET event_date = $1 WHERE id = $2",
            vec![
                (chrono::Utc::now().naive_utc() - chrono::Duration::hours(1)).into(),
                (event_id as i32).into(),
            ],
        ))
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/events/{}/cancel", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Registrations cannot be cancelled after the event has started"
    );

    let resp = app
        .client
        .get(app.url("/my/events"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}
