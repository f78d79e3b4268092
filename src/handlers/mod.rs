pub mod admin;
pub mod article;
pub mod auth;
pub mod category;
pub mod discussion;
pub mod event;
pub mod gallery;
pub mod member;
pub mod navigation;
pub mod notification;
pub mod report;
pub mod upload;

pub use auth::*;
