mod common;

use serde_json::Value;
use serial_test::serial;

async fn reply(app: &common::TestApp, token: &str, discussion_id: i64, content: &str) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/discussions/{}/replies", discussion_id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "content": content }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn discussion_lifecycle() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "author").await;
    let (category_id, slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &token, category_id).await;

    let resp = app
        .client
        .get(app.url(&format!("/categories/{}/discussions", slug)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    let resp = app
        .client
        .put(app.url(&format!("/discussions/{}", discussion_id)))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Lowongan kerja 2026" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/discussions/{}", discussion_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Lowongan kerja 2026");
    assert!(body["data"]["content_html"].as_str().unwrap().contains("lowongan"));

    let resp = app
        .client
        .delete(app.url(&format!("/discussions/{}", discussion_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/discussions/{}", discussion_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[serial]
async fn locked_discussion_rejects_every_reply() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "author").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &token, category_id).await;

    let resp = app
        .client
        .put(app.url(&format!("/discussions/{}/lock", discussion_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_locked"], true);

    for actor in [&token, &admin_token] {
        let resp = reply(&app, actor, discussion_id, "Masih buka?").await;
        assert_eq!(resp.status(), 409);
    }

    let resp = app
        .client
        .get(app.url(&format!("/discussions/{}/replies", discussion_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
#[serial]
async fn only_admins_can_lock_or_pin() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_id, token) = common::create_test_user(&app, "author").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &token, category_id).await;

    for action in ["lock", "pin"] {
        let resp = app
            .client
            .put(app.url(&format!("/discussions/{}/{}", discussion_id, action)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 403);
    }
}

#[tokio::test]
#[serial]
async fn reply_notifies_the_author_but_not_themselves() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, author) = common::create_test_user(&app, "author").await;
    let (_b, other) = common::create_test_user(&app, "other").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &author, category_id).await;

    let resp = reply(&app, &author, discussion_id, "Update: sudah terisi").await;
    assert_eq!(resp.status(), 200);
    let resp = reply(&app, &other, discussion_id, "Terima kasih infonya").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["content_html"]
        .as_str()
        .unwrap()
        .contains("Terima kasih"));

    let resp = app
        .client
        .get(app.url("/notifications"))
        .bearer_auth(&author)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["kind"], "reply");
    assert_eq!(body["data"]["items"][0]["is_read"], false);
}

#[tokio::test]
#[serial]
async fn like_toggles() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, author) = common::create_test_user(&app, "author").await;
    let (_b, fan) = common::create_test_user(&app, "fan").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &author, category_id).await;

    let url = app.url(&format!("/discussions/{}/like", discussion_id));
    let resp = app.client.post(&url).bearer_auth(&fan).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likes_count"], 1);

    let resp = app.client.post(&url).bearer_auth(&fan).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likes_count"], 0);
}

#[tokio::test]
#[serial]
async fn category_with_discussions_cannot_be_deleted() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    common::create_discussion(&app, &admin_token, category_id).await;

    let resp = app
        .client
        .delete(app.url(&format!("/admin/categories/{}", category_id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = app.client.get(app.url("/categories")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
