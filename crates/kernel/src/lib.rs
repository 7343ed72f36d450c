//! Webdesq Kernel Library
//!
//! Reference host for Webdesq plugins: in-memory document storage, schema
//! validation, entity metadata, an event broadcaster, bearer token users,
//! and plugin mounting. The `webdesq` binary in `webdesq-server` serves it.

pub mod app;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod entity;
pub mod query;
pub mod registry;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validator;

pub use app::{Kernel, KernelBuilder};
pub use broadcast::{Broadcaster, Notification};
pub use config::{Config, SiteConfig};
pub use storage::MemoryStorage;
