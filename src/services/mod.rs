pub mod admin;
pub mod article;
pub mod auth;
pub mod bootstrap_admin;
pub mod cache;
pub mod category;
pub mod discussion;
pub mod email;
pub mod event;
pub mod gallery;
pub mod like;
pub mod member;
pub mod navigation;
pub mod notification;
pub mod reminder;
pub mod reply;
pub mod report;
pub mod upload;

use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
    EntityTrait,
};

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match on `col`.
pub(crate) fn contains_ci<E: EntityTrait>(col: E::Column, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    Expr::expr(Func::lower(Expr::col((E::default(), col))))
        .like(LikeExpr::new(pattern).escape('\\'))
}
