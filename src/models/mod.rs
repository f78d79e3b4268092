pub mod article;
pub mod category;
pub mod discussion;
pub mod event;
pub mod event_registration;
pub mod forum_like;
pub mod forum_report;
pub mod forum_target;
pub mod gallery_item;
pub mod notification;
pub mod refresh_token;
pub mod reply;
pub mod user;

pub use article::{ArticleStatus, Entity as Article, Model as ArticleModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use discussion::{Entity as Discussion, Model as DiscussionModel};
pub use event::{Entity as Event, Model as EventModel};
pub use event_registration::{
    Entity as EventRegistration, Model as EventRegistrationModel, RegistrationStatus,
};
pub use forum_like::Entity as ForumLike;
pub use forum_report::{Entity as ForumReport, Model as ForumReportModel, ReportStatus};
pub use forum_target::ForumTarget;
pub use gallery_item::{Entity as GalleryItem, GalleryKind, GalleryStatus, Model as GalleryItemModel};
pub use notification::{Entity as Notification, Model as NotificationModel};
pub use refresh_token::Entity as RefreshToken;
pub use reply::{Entity as Reply, Model as ReplyModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
