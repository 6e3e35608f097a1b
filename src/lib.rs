pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod escrow;
pub mod gateway;
pub mod models;
pub mod observability;
pub mod state;
pub mod store;
