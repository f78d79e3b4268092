mod common;

use serde_json::Value;
use serial_test::serial;

async fn create_article(app: &common::TestApp, admin_token: &str, title: &str) -> Value {
    let resp = app
        .client
        .post(app.url("/admin/articles"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "title": title,
            "content": "Kabar **terbaru** dari kampus.\n\nParagraf kedua."
        }))
        .send()
        .await
        .unwrap();
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(status, 200, "create article failed: {}", body);
    body
}

#[tokio::test]
#[serial]
async fn drafts_stay_hidden_until_published() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;

    let body = create_article(&app, &admin_token, "Dies Natalis").await;
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(body["data"]["slug"], "dies-natalis");
    let id = body["data"]["id"].as_i64().unwrap();

    let resp = app
        .client
        .get(app.url("/articles/dies-natalis"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .put(app.url(&format!("/admin/articles/{}/publish", id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url("/articles/dies-natalis"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["content_html"]
        .as_str()
        .unwrap()
        .contains("<strong>terbaru</strong>"));
    assert!(body["data"]["published_at"].is_string());

    let resp = app.client.get(app.url("/articles")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["items"][0]["excerpt"]
        .as_str()
        .unwrap()
        .starts_with("Kabar terbaru"));
}

#[tokio::test]
#[serial]
async fn clashing_titles_get_numbered_slugs() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;

    let first = create_article(&app, &admin_token, "Info Beasiswa").await;
    let second = create_article(&app, &admin_token, "Info Beasiswa").await;
    assert_eq!(first["data"]["slug"], "info-beasiswa");
    assert_eq!(second["data"]["slug"], "info-beasiswa-2");
}

#[tokio::test]
#[serial]
async fn members_cannot_write_articles() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_id, token) = common::create_test_user(&app, "member").await;

    let resp = app
        .client
        .post(app.url("/admin/articles"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Hoax", "content": "..." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
