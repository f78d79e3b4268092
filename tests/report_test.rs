mod common;

use serde_json::Value;
use serial_test::serial;

async fn file_report(
    app: &common::TestApp,
    token: &str,
    target_type: &str,
    target_id: i64,
    reason: &str,
) -> reqwest::Response {
    app.client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "target_type": target_type,
            "target_id": target_id,
            "reason": reason,
            "description": "Iklan berulang"
        }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn resolving_with_delete_removes_the_discussion() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, spammer) = common::create_test_user(&app, "spammer").await;
    let (_b, reporter) = common::create_test_user(&app, "reporter").await;
    let (_c, second_reporter) = common::create_test_user(&app, "reporter").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &spammer, category_id).await;

    let resp = file_report(&app, &reporter, "discussion", discussion_id, "spam").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "pending");
    let report_id = body["data"]["id"].as_i64().unwrap();

    let resp = file_report(&app, &second_reporter, "discussion", discussion_id, "spam").await;
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .patch(app.url(&format!("/admin/reports/{}", report_id)))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "status": "resolved",
            "admin_notes": "Spam dihapus",
            "delete_content": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "resolved");
    assert_eq!(body["data"]["content_deleted"], true);

    let resp = app
        .client
        .get(app.url(&format!("/discussions/{}", discussion_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // the sibling report was closed along with it
    let resp = app
        .client
        .get(app.url("/admin/reports?status=pending"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
#[serial]
async fn closed_reports_cannot_be_reopened() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, author) = common::create_test_user(&app, "author").await;
    let (_b, reporter) = common::create_test_user(&app, "reporter").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &author, category_id).await;

    let resp = file_report(&app, &reporter, "discussion", discussion_id, "other").await;
    let body: Value = resp.json().await.unwrap();
    let report_id = body["data"]["id"].as_i64().unwrap();

    let url = app.url(&format!("/admin/reports/{}", report_id));
    let resp = app
        .client
        .patch(&url)
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "status": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .patch(&url)
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // the discussion survived
    let resp = app
        .client
        .get(app.url(&format!("/discussions/{}", discussion_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
#[serial]
async fn report_input_is_checked() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_admin_id, admin_token) = common::create_admin(&app).await;
    let (_a, author) = common::create_test_user(&app, "author").await;
    let (_b, reporter) = common::create_test_user(&app, "reporter").await;
    let (category_id, _slug) = common::create_category(&app, &admin_token).await;
    let discussion_id = common::create_discussion(&app, &author, category_id).await;

    let resp = file_report(&app, &reporter, "discussion", discussion_id, "boring").await;
    assert_eq!(resp.status(), 400);

    let resp = file_report(&app, &reporter, "discussion", 999_999, "spam").await;
    assert_eq!(resp.status(), 404);

    let resp = file_report(&app, &reporter, "discussion", discussion_id, "spam").await;
    assert_eq!(resp.status(), 200);
    let resp = file_report(&app, &reporter, "discussion", discussion_id, "spam").await;
    assert_eq!(resp.status(), 409);

    let resp = app
        .client
        .get(app.url("/reports/reasons"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r == "harassment"));
}

#[tokio::test]
#[serial]
async fn members_cannot_see_the_report_queue() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (_id, token) = common::create_test_user(&app, "member").await;

    let resp = app
        .client
        .get(app.url("/admin/reports"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}
