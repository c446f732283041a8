// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod certificate;
pub mod course;
pub mod outreach;
pub mod profile;
pub mod quiz;
pub mod reports;
