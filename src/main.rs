mod cli;
mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;
mod websocket;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use clap::Parser;
use cli::{Args, Command};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use services::cache::CacheService;
use services::email::EmailService;
use services::notification::NotificationService;
use services::upload::UploadConfig;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use websocket::hub::NotificationHub;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::register,
        crate::handlers::login,
        crate::handlers::refresh_token,
        crate::handlers::logout,
        crate::handlers::get_current_user,
        crate::handlers::update_profile,
        // Navigation
        crate::handlers::navigation::get_navigation,
        // Member routes
        crate::handlers::member::list_members,
        crate::handlers::member::get_member,
        // Event routes
        crate::handlers::event::list_events,
        crate::handlers::event::get_event,
        crate::handlers::event::register_for_event,
        crate::handlers::event::cancel_registration,
        crate::handlers::event::my_events,
        crate::handlers::event::admin_list_events,
        crate::handlers::event::create_event,
        crate::handlers::event::update_event,
        crate::handlers::event::delete_event,
        crate::handlers::event::toggle_publish_event,
        crate::handlers::event::list_registrations,
        crate::handlers::event::update_registration_status,
        // Gallery routes
        crate::handlers::gallery::list_gallery,
        crate::handlers::gallery::get_gallery_item,
        crate::handlers::gallery::submit_gallery_item,
        crate::handlers::gallery::my_gallery,
        crate::handlers::gallery::update_gallery_item,
        crate::handlers::gallery::delete_gallery_item,
        crate::handlers::gallery::moderation_queue,
        crate::handlers::gallery::moderate_gallery_item,
        crate::handlers::gallery::admin_delete_gallery_item,
        // Forum routes
        crate::handlers::category::list_categories,
        crate::handlers::category::create_category,
        crate::handlers::category::update_category,
        crate::handlers::category::delete_category,
        crate::handlers::discussion::list_discussions,
        crate::handlers::discussion::get_discussion,
        crate::handlers::discussion::create_discussion,
        crate::handlers::discussion::update_discussion,
        crate::handlers::discussion::delete_discussion,
        crate::handlers::discussion::pin_discussion,
        crate::handlers::discussion::lock_discussion,
        crate::handlers::discussion::list_replies,
        crate::handlers::discussion::create_reply,
        crate::handlers::discussion::update_reply,
        crate::handlers::discussion::delete_reply,
        crate::handlers::discussion::like_discussion,
        crate::handlers::discussion::like_reply,
        // Report routes
        crate::handlers::report::list_report_reasons,
        crate::handlers::report::create_report,
        crate::handlers::report::list_reports,
        crate::handlers::report::resolve_report,
        // Article routes
        crate::handlers::article::list_articles,
        crate::handlers::article::get_article,
        crate::handlers::article::admin_list_articles,
        crate::handlers::article::create_article,
        crate::handlers::article::update_article,
        crate::handlers::article::toggle_publish_article,
        crate::handlers::article::delete_article,
        // Notification routes
        crate::handlers::notification::list_notifications,
        crate::handlers::notification::unread_count,
        crate::handlers::notification::mark_all_read,
        crate::handlers::notification::mark_read,
        // Upload routes
        crate::handlers::upload::upload_avatar,
        crate::handlers::upload::upload_event_image,
        // Admin routes
        crate::handlers::admin::get_stats,
        crate::handlers::admin::list_users,
        crate::handlers::admin::update_user_role,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            crate::models::UserRole,
            // Auth
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::RefreshTokenRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::TokenResponse,
            crate::handlers::auth::UpdateProfileRequest,
            // Navigation
            crate::services::navigation::Navigation,
            crate::services::navigation::NavSection,
            crate::services::navigation::NavItem,
            // Member
            crate::handlers::member::MemberResponse,
            crate::handlers::member::MemberSummary,
            crate::handlers::member::ProfileResponse,
            // Event
            crate::handlers::event::EventRequest,
            crate::handlers::event::EventResponse,
            crate::handlers::event::RegistrationResponse,
            crate::handlers::event::MyEventResponse,
            crate::handlers::event::UpdateRegistrationRequest,
            crate::models::RegistrationStatus,
            // Gallery
            crate::handlers::gallery::GalleryItemResponse,
            crate::handlers::gallery::UpdateGalleryItemRequest,
            crate::handlers::gallery::ModerationAction,
            crate::handlers::gallery::ModerateGalleryItemRequest,
            crate::models::GalleryKind,
            crate::models::GalleryStatus,
            // Forum
            crate::handlers::category::CategoryRequest,
            crate::handlers::category::CategoryResponse,
            crate::handlers::discussion::DiscussionResponse,
            crate::handlers::discussion::DiscussionSummary,
            crate::handlers::discussion::CreateDiscussionRequest,
            crate::handlers::discussion::UpdateDiscussionRequest,
            crate::handlers::discussion::ReplyRequest,
            crate::handlers::discussion::ReplyResponse,
            crate::handlers::discussion::LikeResponse,
            // Report
            crate::handlers::report::CreateReportRequest,
            crate::handlers::report::ResolveReportRequest,
            crate::handlers::report::ReportResponse,
            crate::models::ForumTarget,
            crate::models::ReportStatus,
            // Article
            crate::handlers::article::ArticleSummary,
            crate::handlers::article::ArticleResponse,
            crate::handlers::article::ArticleRequest,
            crate::models::ArticleStatus,
            // Notification
            crate::handlers::notification::NotificationResponse,
            crate::handlers::notification::UnreadCountResponse,
            // Upload
            crate::handlers::upload::UploadResponse,
            // Admin
            crate::handlers::admin::StatsResponse,
            crate::handlers::admin::AdminUserResponse,
            crate::handlers::admin::UpdateRoleRequest,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "navigation", description = "Role based menu"),
        (name = "members", description = "Alumni directory"),
        (name = "events", description = "Events and registrations"),
        (name = "gallery", description = "Photo gallery and moderation"),
        (name = "forum", description = "Categories, discussions and replies"),
        (name = "reports", description = "Forum report moderation"),
        (name = "articles", description = "News articles"),
        (name = "notifications", description = "Notification operations"),
        (name = "uploads", description = "File upload operations"),
        (name = "admin", description = "Administrative operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alumni=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command.unwrap_or_default() {
        Command::Serve => serve().await,
        Command::Migrate => migrate().await,
        Command::SendReminders => {
            send_reminders().await;
            Ok(())
        }
    }
}

async fn migrate() -> anyhow::Result<()> {
    let db = config::database::get_database().await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");
    Ok(())
}

/// Runs the reminder sweep. Never fails the process so a scheduler does not
/// retry a half-finished run.
async fn send_reminders() {
    let report = match run_reminders().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Reminder sweep aborted: {:#}", e);
            services::reminder::ReminderReport::default()
        }
    };

    println!(
        "Reminders sent: {} (events: {}, failed: {})",
        report.sent, report.events, report.failed
    );
}

async fn run_reminders() -> anyhow::Result<services::reminder::ReminderReport> {
    let db = config::database::get_database().await?;
    let notifications = NotificationService::new(db.clone(), NotificationHub::new());
    let email = EmailService::from_env();

    let report = services::reminder::send_event_reminders(&db, &notifications, &email).await?;
    Ok(report)
}

async fn serve() -> anyhow::Result<()> {
    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Alumni API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::bootstrap_admin::ensure_bootstrap_admin(&db).await?;

    let hub = NotificationHub::new();

    let upload_config = UploadConfig::from_env();
    let upload_dir = upload_config.upload_dir.clone();

    // Redis/Cache is optional - graceful degradation if unavailable
    let cache = match config::redis::get_redis().await {
        Ok(conn) => {
            tracing::info!("Redis connected successfully");
            Some(CacheService::new(conn))
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, running without cache: {}", e);
            None
        }
    };

    let email_service = EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, reminder mails will be skipped");
    }

    let mut app = create_app(&upload_dir)
        .layer(Extension(db))
        .layer(Extension(hub))
        .layer(Extension(upload_config))
        .layer(Extension(email_service));

    if let Some(cache) = cache {
        app = app.layer(Extension(cache));
    }

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let upload_dir = UploadConfig::from_env().upload_dir;
    std::fs::create_dir_all(&upload_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create upload directory '{}': {}", upload_dir, e)
    })?;

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(upload_dir: &str) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Alumni API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
