pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod models;
pub mod session;
pub mod shell;
pub mod store;
pub mod validation;
