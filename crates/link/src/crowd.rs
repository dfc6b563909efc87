//! Crowd-resolution aggregation: collapse multiple independent worker
//! responses per unresolved record into a single consensus answer.

use std::collections::BTreeMap;

use crate::model::{ConsensusAnswer, WorkerResponse};

/// Sentinel for "no valid identifier". Counted as a vote like any other.
pub const NOT_FOUND: &str = "NA";

/// Clean one raw free-text answer:
/// - an embedded "NCES" marker followed by a value → the extracted digits;
/// - internal whitespace or the word "grade" → not a valid identifier, "NA";
/// - anything else passes through trimmed.
pub fn clean_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some(pos) = lower.find("nces") {
        let after = &trimmed[pos + "nces".len()..];
        let digits: String = after
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return digits;
        }
    }

    if lower.contains("grade") || trimmed.chars().any(char::is_whitespace) {
        return NOT_FOUND.to_string();
    }

    trimmed.to_string()
}

/// Majority vote over cleaned answers, grouped by CEEB code. Only approved
/// responses count. A value wins with strictly more than half the group's
/// votes; ties and pluralities resolve to "NA".
/// Groups with zero responses are not emitted.
pub fn aggregate(responses: &[WorkerResponse]) -> Vec<ConsensusAnswer> {
    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for response in responses.iter().filter(|r| r.approved) {
        groups
            .entry(response.ceeb.as_str())
            .or_default()
            .push(clean_answer(&response.answer));
    }

    groups
        .into_iter()
        .map(|(ceeb, votes)| {
            let total = votes.len();
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for vote in &votes {
                *counts.entry(vote.as_str()).or_insert(0) += 1;
            }

            let winner = counts
                .into_iter()
                .find(|(_, count)| count * 2 > total)
                .map(|(value, _)| value.to_string());

            ConsensusAnswer {
                ceeb: ceeb.to_string(),
                nces_id: winner.filter(|v| v != NOT_FOUND),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(ceeb: &str, answer: &str) -> WorkerResponse {
        WorkerResponse {
            worker_id: format!("w_{answer}"),
            ceeb: ceeb.into(),
            answer: answer.into(),
            approved: true,
        }
    }

    #[test]
    fn clean_extracts_embedded_marker_value() {
        assert_eq!(clean_answer("NCES ID: 123456789012"), "123456789012");
        assert_eq!(clean_answer("the nces number is 0042"), "0042");
    }

    #[test]
    fn clean_rejects_prose_and_grade_answers() {
        assert_eq!(clean_answer("I could not find it"), "NA");
        assert_eq!(clean_answer("Grade 9-12"), "NA");
        assert_eq!(clean_answer("K-8 GRADE"), "NA");
    }

    #[test]
    fn clean_passes_bare_identifiers_through() {
        assert_eq!(clean_answer("  1234567  "), "1234567");
        assert_eq!(clean_answer("NA"), "NA");
    }

    #[test]
    fn strict_majority_wins() {
        // {A:3, B:1, NA:1} over 5 votes → A (3 > 2.5)
        let responses = vec![
            response("300", "A"),
            response("300", "A"),
            response("300", "B"),
            response("300", "NA"),
            response("300", "A"),
        ];
        let answers = aggregate(&responses);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].nces_id.as_deref(), Some("A"));
    }

    #[test]
    fn plurality_without_majority_is_na() {
        // {A:2, B:2, NA:1} over 5 votes → no value exceeds 2.5
        let responses = vec![
            response("300", "A"),
            response("300", "A"),
            response("300", "B"),
            response("300", "B"),
            response("300", "NA"),
        ];
        let answers = aggregate(&responses);
        assert_eq!(answers[0].nces_id, None);
    }

    #[test]
    fn na_majority_is_not_a_positive_identification() {
        let responses = vec![
            response("300", "no idea"),
            response("300", "could not find"),
            response("300", "1234567"),
        ];
        let answers = aggregate(&responses);
        assert_eq!(answers[0].nces_id, None);
    }

    #[test]
    fn unapproved_responses_do_not_count() {
        let mut rejected = response("300", "9999999");
        rejected.approved = false;
        let responses = vec![
            rejected,
            response("300", "1234567"),
            response("300", "1234567"),
        ];
        let answers = aggregate(&responses);
        assert_eq!(answers[0].nces_id.as_deref(), Some("1234567"));
    }

    #[test]
    fn zero_response_groups_are_omitted() {
        let mut rejected = response("400", "1");
        rejected.approved = false;
        let answers = aggregate(&[rejected]);
        assert!(answers.is_empty());
    }

    #[test]
    fn end_to_end_consensus_example() {
        // 4 responses {"1234567","1234567","NA","1234567"} → 3/4 > 1/2
        let responses = vec![
            response("300", "1234567"),
            response("300", "1234567"),
            response("300", "NA"),
            response("300", "1234567"),
        ];
        let answers = aggregate(&responses);
        assert_eq!(answers[0].nces_id.as_deref(), Some("1234567"));
    }
}
