// src/utils/import.rs

//! Bulk question import.
//!
//! One question per line, fields separated by `|`:
//! `text|option_a|option_b|option_c|option_d|answer_letter|explanation`

use crate::models::question::normalize_answer_letter;

/// Lines with fewer fields are rejected.
pub const MIN_FIELDS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub answer: String,
    pub explanation: String,
}

#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub questions: Vec<ParsedQuestion>,

    /// 1-based line numbers that could not be imported.
    pub rejected_lines: Vec<usize>,
}

/// Parses one line. `None` when it has fewer than [`MIN_FIELDS`] fields.
pub fn parse_line(line: &str) -> Option<ParsedQuestion> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() < MIN_FIELDS {
        return None;
    }
    let field = |i: usize| parts.get(i).map(|s| s.to_string()).unwrap_or_default();

    Some(ParsedQuestion {
        text: field(0),
        option_a: field(1),
        option_b: field(2),
        option_c: field(3),
        option_d: field(4),
        answer: normalize_answer_letter(parts[5]).unwrap_or_else(|| "a".to_string()),
        explanation: field(6),
    })
}

/// Parses a whole upload. Blank lines are skipped, a leading BOM is ignored.
pub fn parse_import(data: &str) -> ImportOutcome {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut outcome = ImportOutcome::default();

    for (index, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(question) => outcome.questions.push(question),
            None => outcome.rejected_lines.push(index + 1),
        }
    }
    outcome
}
