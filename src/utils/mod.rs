// src/utils/mod.rs

pub mod hash;
pub mod html;
pub mod import;
pub mod jwt;
pub mod report;
