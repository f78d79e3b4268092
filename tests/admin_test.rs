mod common;

use serde_json::Value;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn stats_count_the_portal() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "member").await;
    let event_id = common::create_event(&app, &admin_token, None).await;

    app.client
        .post(app.url(&format!("/events/{}/register", event_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["members"], 2);
    assert_eq!(body["data"]["published_events"], 1);
    assert_eq!(body["data"]["upcoming_events"], 1);
    assert_eq!(body["data"]["active_registrations"], 1);
    assert_eq!(body["data"]["pending_reports"], 0);

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
#[serial]
async fn list_users_filters_by_role() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    common::create_test_user(&app, "member").await;
    common::create_test_user(&app, "member").await;

    let resp = app
        .client
        .get(app.url("/admin/users?role=alumni"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    assert!(body["data"]["items"][0]["email"].is_string());

    let resp = app
        .client
        .get(app.url("/admin/users?role=admin"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
#[serial]
async fn admins_cannot_change_their_own_role() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (admin_id, admin_token) = common::create_admin(&app).await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", admin_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "alumni" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .put(app.url("/admin/users/999999/role"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
