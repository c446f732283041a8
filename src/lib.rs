// src/lib.rs

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod models;
pub mod quiz;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;
pub mod whitelist;

pub use routes::create_router;
