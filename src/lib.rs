pub mod auth;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod inbox;
pub mod listing;
pub mod models;
pub mod moderation;
pub mod network;
pub mod openapi;
pub mod policy;
pub mod projects;
pub mod rate_limit; // in-memory rate limiting
pub mod repo;
pub mod routes;
pub mod security;
pub mod seed;
pub mod workspace;

// Re-export commonly used items for tests / external users
pub use config::AppConfig;
pub use routes::{config as configure, AppState};
pub use security::SecurityHeaders;
