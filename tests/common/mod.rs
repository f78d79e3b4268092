#![allow(dead_code)]

use chrono::{Duration, Utc};
use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static CATEGORY_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// 1x1 PNG header; enough for the magic byte check.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = alumni::config::jwt::JwtConfig::from_env().unwrap();
        let _ = alumni::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

/// Starts the full router on a random port against a clean database.
/// Returns `None` when no database is configured so the suite can be run
/// without Postgres.
pub async fn spawn_app() -> Option<TestApp> {
    init_env();

    let Ok(database_url) =
        std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
    else {
        eprintln!("TEST_DATABASE_URL not set, skipping integration test");
        return None;
    };

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        alumni::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let hub = alumni::websocket::hub::NotificationHub::new();
    let upload_config = alumni::services::upload::UploadConfig {
        upload_dir: "./test_uploads".to_string(),
        max_file_size: 1024 * 1024,
    };
    let email_service = alumni::services::email::EmailService::disabled();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(alumni::routes::create_routes())
        .layer(axum::middleware::from_fn(
            alumni::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(hub))
        .layer(axum::extract::Extension(upload_config))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    })
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "refresh_tokens",
        "notifications",
        "forum_reports",
        "forum_likes",
        "replies",
        "discussions",
        "categories",
        "articles",
        "gallery_items",
        "event_registrations",
        "events",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a member and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": username,
            "email": format!("{}@alumni.test", username),
            "password": "test_password_123",
            "full_name": format!("Alumni {}", counter),
            "batch": 2015,
            "major": "Teknik Informatika"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for '{}': status={}, error={}",
            username, status, e
        )
    });
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to register '{}': status={}, body={}", username, status, body);
    }

    let user_id = body["data"]["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing user id: {}", body)) as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing token: {}", body))
        .to_string();
    (user_id, token)
}

/// Register a member and promote them to admin.
pub async fn create_admin(app: &TestApp) -> (i32, String) {
    let (id, token) = create_test_user(app, "admin").await;
    make_admin(&app.db, id).await;
    (id, token)
}

/// Make a user admin by directly updating the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role = 'admin' WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user admin");
}

/// `YYYY-MM-DDTHH:MM:SS`, `days` from now.
pub fn days_from_now(days: i64) -> String {
    (Utc::now().naive_utc() + Duration::days(days))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Create a published event a week out and return its id.
pub async fn create_event(app: &TestApp, admin_token: &str, max_participants: Option<i32>) -> i64 {
    let resp = app
        .client
        .post(app.url("/admin/events"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "title": "Reuni Angkatan",
            "description": "Temu kangen **alumni**",
            "location": "Aula Utama",
            "event_date": days_from_now(7),
            "max_participants": max_participants,
            "is_published": true
        }))
        .send()
        .await
        .expect("Failed to create event");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse event response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create event: status={}, body={}", status, body);
    }
    body["data"]["id"].as_i64().expect("Event response missing id")
}

/// Create a forum category and return (id, slug).
pub async fn create_category(app: &TestApp, admin_token: &str) -> (i64, String) {
    let counter = CATEGORY_COUNTER.fetch_add(1, Ordering::SeqCst);

    let resp = app
        .client
        .post(app.url("/admin/categories"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": format!("Diskusi Umum {}", counter),
            "description": "Obrolan bebas"
        }))
        .send()
        .await
        .expect("Failed to create category");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse category response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create category: status={}, body={}", status, body);
    }
    (
        body["data"]["id"].as_i64().expect("Category response missing id"),
        body["data"]["slug"]
            .as_str()
            .expect("Category response missing slug")
            .to_string(),
    )
}

/// Start a discussion and return its id.
pub async fn create_discussion(app: &TestApp, token: &str, category_id: i64) -> i64 {
    let resp = app
        .client
        .post(app.url("/discussions"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "category_id": category_id,
            "title": "Lowongan kerja 2025",
            "content": "Ada info lowongan?"
        }))
        .send()
        .await
        .expect("Failed to create discussion");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse discussion response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create discussion: status={}, body={}", status, body);
    }
    body["data"]["id"].as_i64().expect("Discussion response missing id")
}
