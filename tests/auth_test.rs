mod common;

use serde_json::Value;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn register_login_and_me() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "siti",
            "email": "siti@alumni.test",
            "password": "password_123",
            "full_name": "Siti Rahma",
            "batch": 2012
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["role"], "alumni");

    // username or email both work
    for login in ["siti", "SITI@alumni.test"] {
        let resp = app
            .client
            .post(app.url("/auth/login"))
            .json(&serde_json::json!({ "login": login, "password": "password_123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "login with {}", login);
    }

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "login": "siti", "password": "wrong_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let token = body["data"]["token"].as_str().unwrap();
    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["full_name"], "Siti Rahma");
    assert_eq!(body["data"]["email"], "siti@alumni.test");
}

#[tokio::test]
#[serial]
async fn duplicate_registration_is_a_conflict() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let payload = serde_json::json!({
        "username": "budi",
        "email": "budi@alumni.test",
        "password": "password_123",
        "full_name": "Budi"
    });
    let resp = app.client.post(app.url("/auth/register")).json(&payload).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = app.client.post(app.url("/auth/register")).json(&payload).send().await.unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
#[serial]
async fn refresh_tokens_rotate() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": "rina",
            "email": "rina@alumni.test",
            "password": "password_123",
            "full_name": "Rina"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let rotated = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    // the old token was consumed
    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": refresh }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .json(&serde_json::json!({ "refresh_token": rotated }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .post(app.url("/auth/refresh"))
        .json(&serde_json::json!({ "refresh_token": rotated }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[serial]
async fn protected_routes_need_a_token() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let resp = app.client.get(app.url("/auth/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/my/events"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[serial]
async fn navigation_follows_the_role() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_id, member) = common::create_test_user(&app, "member").await;
    let (_admin_id, admin) = common::create_admin(&app).await;

    let sections = |body: &Value| -> Vec<String> {
        body["data"]["sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["title"].as_str().unwrap().to_string())
            .collect()
    };

    let resp = app.client.get(app.url("/navigation")).send().await.unwrap();
    let guest: Value = resp.json().await.unwrap();
    assert!(guest["data"]["role"].is_null());

    let resp = app
        .client
        .get(app.url("/navigation"))
        .bearer_auth(&member)
        .send()
        .await
        .unwrap();
    let alumni: Value = resp.json().await.unwrap();
    assert_eq!(alumni["data"]["role"], "alumni");

    let resp = app
        .client
        .get(app.url("/navigation"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let admin: Value = resp.json().await.unwrap();
    assert_eq!(admin["data"]["role"], "admin");

    assert!(sections(&guest).len() < sections(&alumni).len());
    assert!(sections(&alumni).len() < sections(&admin).len());
    assert!(sections(&admin).iter().any(|s| s == "Administrasi"));
}
