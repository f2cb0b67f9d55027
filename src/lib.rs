pub mod api;
pub mod config;
pub mod datasets;
pub mod error;
pub mod models;
pub mod services;
