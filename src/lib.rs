pub mod auth;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod routes;
