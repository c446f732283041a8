// src/models/analytics.rs

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DepartmentStats {
    pub department: String,
    pub users: i64,
    pub attempts: i64,
    pub passes: i64,

    /// Whole percent of valid attempts that passed.
    pub pass_rate: i64,
}

/// Dashboard numbers. Only valid results are counted.
#[derive(Debug, Serialize)]
pub struct AnalyticsOverview {
    /// Learners and trainers.
    pub total_users: i64,
    pub total_courses: i64,

    /// Distinct (learner, course) pairs with a valid pass.
    pub total_passes: i64,
    pub total_attempts: i64,
    pub departments: Vec<DepartmentStats>,
}

pub fn pass_rate(passes: i64, attempts: i64) -> i64 {
    if attempts <= 0 {
        return 0;
    }
    (passes as f64 * 100.0 / attempts as f64).round() as i64
}
