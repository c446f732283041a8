// src/quiz/mod.rs

//! Quiz eligibility and scoring engine.

pub mod eligibility;
pub mod ledger;
pub mod sampling;
pub mod scoring;
