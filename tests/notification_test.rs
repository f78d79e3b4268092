mod common;

use serde_json::Value;
use serial_test::serial;

/// Two replies from `other` on a discussion owned by `author`.
async fn seed(app: &common::TestApp) -> (String, String) {
    let (_admin_id, admin_token) = common::create_admin(app).await;
    let (_a, author) = common::create_test_user(app, "author").await;
    let (_b, other) = common::create_test_user(app, "other").await;
    let (category_id, _slug) = common::create_category(app, &admin_token).await;
    let discussion_id = common::create_discussion(app, &author, category_id).await;

    for content in ["Pertama", "Kedua"] {
        let resp = app
            .client
            .post(app.url(&format!("/discussions/{}/replies", discussion_id)))
            .bearer_auth(&other)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
    (author, other)
}

async fn unread(app: &common::TestApp, token: &str) -> i64 {
    let resp = app
        .client
        .get(app.url("/notifications/unread-count"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    body["data"]["count"].as_i64().unwrap()
}

#[tokio::test]
#[serial]
async fn mark_one_then_all_read() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (author, _other) = seed(&app).await;
    assert_eq!(unread(&app, &author).await, 2);

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let first_id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", first_id)))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_read"], true);
    assert_eq!(unread(&app, &author).await, 1);

    let resp = app
        .client
        .get(app.url("/notifications?unread_only=true"))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    let resp = app
        .client
        .put(app.url("/notifications/read-all"))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["marked_read"], 1);
    assert_eq!(unread(&app, &author).await, 0);
}

#[tokio::test]
#[serial]
async fn cannot_read_someone_elses_notification() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (author, other) = seed(&app).await;

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let id = body["data"]["items"][0]["id"].as_i64().unwrap();

    let resp = app
        .client
        .put(app.url(&format!("/notifications/{}/read", id)))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(unread(&app, &author).await, 2);
}
