pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod utils;
pub mod websocket;

pub use error::{AppError, AppResult};
pub use middleware::auth::{AuthUser, MaybeAuthUser};
pub use response::{ApiResponse, PaginatedResponse, PaginationQuery};
