use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::websocket;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // WebSocket route (auth handled inside the handler via query token)
        .route("/ws", routing::get(websocket::notification::ws_handler))
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: register, login, refresh.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        .route("/auth/refresh", routing::post(handlers::refresh_token))
        .route("/auth/logout", routing::post(handlers::logout));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes. Handlers that care about the viewer resolve it
/// themselves.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/navigation",
            routing::get(handlers::navigation::get_navigation),
        )
        // Members
        .route("/members", routing::get(handlers::member::list_members))
        .route("/members/{id}", routing::get(handlers::member::get_member))
        // Events
        .route("/events", routing::get(handlers::event::list_events))
        .route("/events/{id}", routing::get(handlers::event::get_event))
        // Gallery
        .route("/gallery", routing::get(handlers::gallery::list_gallery))
        .route(
            "/gallery/{id}",
            routing::get(handlers::gallery::get_gallery_item),
        )
        // Forum
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        .route(
            "/categories/{slug}/discussions",
            routing::get(handlers::discussion::list_discussions),
        )
        .route(
            "/discussions/{id}",
            routing::get(handlers::discussion::get_discussion),
        )
        .route(
            "/discussions/{id}/replies",
            routing::get(handlers::discussion::list_replies),
        )
        .route(
            "/reports/reasons",
            routing::get(handlers::report::list_report_reasons),
        )
        // Articles
        .route("/articles", routing::get(handlers::article::list_articles))
        .route(
            "/articles/{slug}",
            routing::get(handlers::article::get_article),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: everything that needs a signed-in member. Admin-only
/// routes are checked in the handler.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/auth/profile", routing::put(handlers::update_profile))
        // Events
        .route(
            "/events/{id}/register",
            routing::post(handlers::event::register_for_event),
        )
        .route(
            "/events/{id}/cancel",
            routing::post(handlers::event::cancel_registration),
        )
        .route("/my/events", routing::get(handlers::event::my_events))
        // Gallery
        .route(
            "/gallery",
            routing::post(handlers::gallery::submit_gallery_item),
        )
        .route(
            "/gallery/{id}",
            routing::put(handlers::gallery::update_gallery_item)
                .delete(handlers::gallery::delete_gallery_item),
        )
        .route("/my/gallery", routing::get(handlers::gallery::my_gallery))
        // Discussions
        .route(
            "/discussions",
            routing::post(handlers::discussion::create_discussion),
        )
        .route(
            "/discussions/{id}",
            routing::put(handlers::discussion::update_discussion)
                .delete(handlers::discussion::delete_discussion),
        )
        .route(
            "/discussions/{id}/pin",
            routing::put(handlers::discussion::pin_discussion),
        )
        .route(
            "/discussions/{id}/lock",
            routing::put(handlers::discussion::lock_discussion),
        )
        .route(
            "/discussions/{id}/like",
            routing::post(handlers::discussion::like_discussion),
        )
        // Replies
        .route(
            "/discussions/{id}/replies",
            routing::post(handlers::discussion::create_reply),
        )
        .route(
            "/replies/{id}",
            routing::put(handlers::discussion::update_reply)
                .delete(handlers::discussion::delete_reply),
        )
        .route(
            "/replies/{id}/like",
            routing::post(handlers::discussion::like_reply),
        )
        // Reports
        .route("/reports", routing::post(handlers::report::create_report))
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            routing::put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            routing::put(handlers::notification::mark_read),
        )
        // Upload
        .route(
            "/upload/avatar",
            routing::post(handlers::upload::upload_avatar),
        )
        // Admin
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
        .route(
            "/admin/events",
            routing::get(handlers::event::admin_list_events)
                .post(handlers::event::create_event),
        )
        .route(
            "/admin/events/{id}",
            routing::put(handlers::event::update_event).delete(handlers::event::delete_event),
        )
        .route(
            "/admin/events/{id}/publish",
            routing::put(handlers::event::toggle_publish_event),
        )
        .route(
            "/admin/events/{id}/registrations",
            routing::get(handlers::event::list_registrations),
        )
        .route(
            "/admin/registrations/{id}",
            routing::patch(handlers::event::update_registration_status),
        )
        .route(
            "/admin/upload/event-image",
            routing::post(handlers::upload::upload_event_image),
        )
        .route(
            "/admin/gallery",
            routing::get(handlers::gallery::moderation_queue),
        )
        .route(
            "/admin/gallery/{id}",
            routing::patch(handlers::gallery::moderate_gallery_item)
                .delete(handlers::gallery::admin_delete_gallery_item),
        )
        .route(
            "/admin/categories",
            routing::post(handlers::category::create_category),
        )
        .route(
            "/admin/categories/{id}",
            routing::put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        .route(
            "/admin/reports",
            routing::get(handlers::report::list_reports),
        )
        .route(
            "/admin/reports/{id}",
            routing::patch(handlers::report::resolve_report),
        )
        .route(
            "/admin/articles",
            routing::get(handlers::article::admin_list_articles)
                .post(handlers::article::create_article),
        )
        .route(
            "/admin/articles/{id}",
            routing::put(handlers::article::update_article)
                .delete(handlers::article::delete_article),
        )
        .route(
            "/admin/articles/{id}/publish",
            routing::put(handlers::article::toggle_publish_article),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!(?rule, "Invalid rate limit rule, route group left unthrottled");
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
