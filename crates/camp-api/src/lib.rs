pub mod advanced;
pub mod aggregate;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod geocoder;
pub mod json;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod upload;
