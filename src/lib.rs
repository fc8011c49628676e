pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod runner;
pub mod service;
pub mod types;

pub use error::SiteError;
pub use router::{SiteState, site_router};
