//! Field-by-field answer checking.
//!
//! Answers are compared after normalization: surrounding and repeated
//! whitespace is ignored, `a.b.c.d mask` is read as CIDR, and mask fields
//! accept either `/n`, `n` or the dotted form.

use crate::models::{mask_to_prefix, parse_address, parse_cidr, MAX_LENGTH};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fields whose value is a mask or prefix length.
const MASK_FIELDS: [&str; 4] = ["mask", "new_mask", "prefix", "new_prefix"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldResult {
    pub field: String,
    pub expected: String,
    pub given: Option<String>,
    pub correct: bool,
}

/// Outcome of [`super::ExerciseProblem::check_answers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerReport {
    pub fields: Vec<FieldResult>,
    pub correct: usize,
    pub total: usize,
}

impl AnswerReport {
    pub fn all_correct(&self) -> bool {
        self.correct == self.total
    }
}

pub(crate) fn check(
    expected: &BTreeMap<String, String>,
    answers: &BTreeMap<String, String>,
) -> AnswerReport {
    let fields: Vec<FieldResult> = expected
        .iter()
        .map(|(field, want)| {
            let given = answers.get(field).cloned();
            let correct = given
                .as_deref()
                .map(|got| answer_matches(field, want, got))
                .unwrap_or(false);
            FieldResult {
                field: field.clone(),
                expected: want.clone(),
                given,
                correct,
            }
        })
        .collect();
    let correct = fields.iter().filter(|f| f.correct).count();
    log::debug!("check_answers: {correct}/{} correct", fields.len());
    AnswerReport {
        total: fields.len(),
        correct,
        fields,
    }
}

fn answer_matches(field: &str, expected: &str, given: &str) -> bool {
    if MASK_FIELDS.contains(&field) {
        return match (as_prefix(expected), as_prefix(given)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
    }
    canonical(expected) == canonical(given)
}

/// `/26`, `26` and `255.255.255.192` all read as 26.
fn as_prefix(value: &str) -> Option<u8> {
    let value = value.trim();
    if let Ok(addr) = parse_address(value) {
        return mask_to_prefix(u32::from(addr)).ok();
    }
    value
        .strip_prefix('/')
        .unwrap_or(value)
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|p| *p <= MAX_LENGTH)
}

fn canonical(value: &str) -> String {
    let compact = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let as_cidr = if compact.contains('/') {
        compact.replace(' ', "")
    } else {
        compact.replacen(' ', "/", 1)
    };
    if let Ok((addr, prefix)) = parse_cidr(&as_cidr) {
        return format!("{addr}/{prefix}");
    }
    if let Ok(addr) = parse_address(&compact) {
        return addr.to_string();
    }
    compact.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mask_fields_accept_any_form() {
        assert!(answer_matches("mask", "255.255.255.192", "/26"));
        assert!(answer_matches("mask", "255.255.255.192", " 26 "));
        assert!(answer_matches("new_prefix", "/26", "255.255.255.192"));
        assert!(!answer_matches("mask", "255.255.255.192", "/27"));
        assert!(!answer_matches("mask", "255.255.255.192", "255.255.0.255"));
    }

    #[test]
    fn test_cidr_forms() {
        assert!(answer_matches("summary", "192.168.0.0/22", "192.168.0.0 / 22"));
        assert!(answer_matches("summary", "192.168.0.0/22", "192.168.0.0 255.255.252.0"));
        assert!(!answer_matches("summary", "192.168.0.0/22", "192.168.0.0/23"));
    }

    #[test]
    fn test_plain_values_only_trim() {
        assert!(answer_matches("usable_hosts", "62", "  62"));
        assert!(!answer_matches("usable_hosts", "62", "/62"));
        assert!(!answer_matches("network", "128.0.0.0", "/1"));
    }

    #[test]
    fn test_report_counts_missing_fields() {
        let expected = map(&[("network", "10.0.0.0"), ("broadcast", "10.0.0.255")]);
        let report = check(&expected, &map(&[("network", "10.0.0.0"), ("extra", "x")]));
        assert_eq!(report.total, 2);
        assert_eq!(report.correct, 1);
        assert!(!report.all_correct());
        let broadcast = report.fields.iter().find(|f| f.field == "broadcast").unwrap();
        assert_eq!(broadcast.given, None);
        assert!(!broadcast.correct);
    }
}
