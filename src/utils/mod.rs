pub mod cookie;
pub mod jwt;
pub mod markdown;
pub mod password;
pub mod slug;

pub use jwt::{encode_access_token, encode_refresh_token, hash_refresh_token};
pub use markdown::{render_markdown, render_plain_excerpt};
pub use password::{hash_password, verify_password};
pub use slug::slugify;
