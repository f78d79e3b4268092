mod common;

use serde_json::Value;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn directory_filters_and_hides_contact_details() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (id, token) = common::create_test_user(&app, "dewi").await;
    common::create_test_user(&app, "agus").await;

    let resp = app
        .client
        .put(app.url("/auth/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "batch": 2010,
            "company": "PT Nusantara",
            "city": "Bandung"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.get(app.url("/members")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    assert!(body["data"]["items"][0].get("email").is_none());

    let resp = app
        .client
        .get(app.url("/members?batch=2010"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"].as_i64().unwrap(), id as i64);
    assert_eq!(body["data"]["items"][0]["city"], "Bandung");

    let resp = app
        .client
        .get(app.url("/members?search=AGUS"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);

    // LIKE wildcards are literal
    let resp = app
        .client
        .get(app.url("/members?search=%25"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
#[serial]
async fn banned_members_drop_out_of_the_directory() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (id, token) = common::create_test_user(&app, "troll").await;

    let resp = app
        .client
        .put(app.url(&format!("/admin/users/{}/role", id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "role": "banned" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/members/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
