//! Browser-side auth flow: an HTTP client for the `/api` endpoints and the
//! page state it drives (header, message banner, sidebar, navigation).

pub mod api;
pub mod page;
pub mod ui;

pub use api::{ClientError, SiteClient};
pub use page::AuthPage;
pub use ui::{Banner, BannerKind, HeaderDisplay, Sidebar, topic_button_target};
