pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod slots;
