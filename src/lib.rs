pub mod app;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod sanitize;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;
