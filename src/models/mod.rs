// src/models/mod.rs

pub mod analytics;
pub mod course;
pub mod question;
pub mod result;
pub mod retest;
pub mod user;
pub mod whitelist;
