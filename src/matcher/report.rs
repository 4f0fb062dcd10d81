//! Failure diagnostics for [`ContainSequence`](super::ContainSequence).

use std::fmt::Write as _;

use serde::Serialize;

use crate::record::{Data, LogRecord, canonical_json};

use super::entry::Expectation;
use super::sequence::SequenceOutcome;

/// Maximum edit distance for the closest-message hint.
const MAX_HINT_DISTANCE: usize = 3;

/// Renders a data map as compact JSON with sorted keys.
#[must_use]
pub fn render_data(data: &Data) -> String {
    canonical_json(&serde_json::Value::Object(data.clone().into_inner()))
}

/// Renders one record as a single line.
#[must_use]
pub fn render_record(record: &LogRecord) -> String {
    let mut line = format!(
        "{} source={} message={} data={}",
        record.level,
        record.source,
        record.message,
        render_data(&record.data)
    );
    if let Some(error) = &record.error {
        let _ = write!(line, " error={error}");
    }
    line
}

/// Renders records one per indented line, prefixed with their index.
#[must_use]
pub fn render_records(records: &[LogRecord]) -> String {
    indexed(records.iter().map(render_record))
}

/// Renders expectations one per indented line, prefixed with their index.
#[must_use]
pub fn render_expectations(expected: &[Expectation]) -> String {
    indexed(expected.iter().map(ToString::to_string))
}

fn indexed(lines: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = lines.enumerate().map(|(i, l)| format!("[{i}] {l}")).collect();
    if lines.is_empty() {
        "(none)".to_owned()
    } else {
        lines.join("\n\t")
    }
}

/// Builds the failure text for a positive or negated assertion.
#[must_use]
pub fn failure_message(
    actual: &[LogRecord],
    expected: &[Expectation],
    outcome: Option<&SequenceOutcome>,
    negated: bool,
) -> String {
    let verb = if negated { "not to contain" } else { "to contain" };
    let mut text = format!(
        "Expected\n\t{}\n{verb} log sequence \n\t{}",
        render_records(actual),
        render_expectations(expected)
    );

    if let Some(SequenceOutcome::Missing { expectation, matched }) = outcome {
        if let Some(missing) = expected.get(*expectation) {
            let _ = write!(
                text,
                "\nfirst unmatched expectation [{expectation}] {missing} \
                 (after {} matched)",
                matched.len()
            );
            if let Some(hint) = closest_message(actual, &missing.message) {
                let _ = write!(text, "\nclosest actual message: {hint}");
            }
        }
    }
    text
}

/// Returns the actual message closest to `wanted`, if any is within
/// [`MAX_HINT_DISTANCE`] edits.
#[must_use]
pub fn closest_message(actual: &[LogRecord], wanted: &str) -> Option<String> {
    if wanted.is_empty() {
        return None;
    }
    actual
        .iter()
        .map(|r| (r.message.as_str(), strsim::damerau_levenshtein(wanted, &r.message)))
        .filter(|(_, dist)| *dist <= MAX_HINT_DISTANCE)
        .min_by_key(|(_, dist)| *dist)
        .map(|(msg, _)| msg.to_owned())
}

/// Machine-readable summary of a match attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Report<'a> {
    /// Whether the assertion held (after negation).
    pub passed: bool,
    /// Whether the sequence was asserted absent.
    pub negated: bool,
    /// Number of records decoded.
    pub records: usize,
    /// Expected sequence.
    pub expected: &'a [Expectation],
    /// Search result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'a SequenceOutcome>,
    /// Closest actual message to the first unmatched expectation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest_message: Option<String>,
}

impl<'a> Report<'a> {
    /// Summarizes an attempt over `actual`.
    #[must_use]
    pub fn new(
        actual: &[LogRecord],
        expected: &'a [Expectation],
        outcome: Option<&'a SequenceOutcome>,
        negated: bool,
    ) -> Self {
        let found = outcome.is_some_and(SequenceOutcome::is_found);
        let closest_message = match outcome {
            Some(SequenceOutcome::Missing { expectation, .. }) => expected
                .get(*expectation)
                .and_then(|e| closest_message(actual, &e.message)),
            _ => None,
        };
        Self {
            passed: found != negated,
            negated,
            records: actual.len(),
            expected,
            outcome,
            closest_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::entry::{data, debug, info, message};
    use crate::record::LogLevel;

    fn rec(level: LogLevel, msg: &str) -> LogRecord {
        LogRecord {
            timestamp: "1.000000000".to_owned(),
            source: "svc".to_owned(),
            message: msg.to_owned(),
            level: level.into(),
            data: Data::from([("task", "t")]),
            error: None,
        }
    }

    #[test]
    fn render_data_is_sorted_and_compact() {
        let data = Data::from([("b", 2.0), ("a", 1.5)]);
        assert_eq!(render_data(&data), r#"{"a":1.5,"b":2}"#);
    }

    #[test]
    fn render_record_includes_error_when_present() {
        let mut r = rec(LogLevel::Error, "svc.fail");
        r.error = Some("boom".to_owned());
        assert_eq!(
            render_record(&r),
            r#"error source=svc message=svc.fail data={"task":"t"} error=boom"#
        );
    }

    #[test]
    fn failure_message_layout() {
        let actual = vec![rec(LogLevel::Info, "svc.start")];
        let expected = vec![info([message("svc.start")])];
        let text = failure_message(&actual, &expected, None, false);
        assert_eq!(
            text,
            "Expected\n\t[0] info source=svc message=svc.start data={\"task\":\"t\"}\n\
             to contain log sequence \n\t[0] info message=svc.start"
        );
    }

    #[test]
    fn negated_message_uses_not_to_contain() {
        let text = failure_message(&[], &[], None, true);
        assert!(text.contains("not to contain log sequence"));
        assert!(text.contains("(none)"));
    }

    #[test]
    fn failure_message_names_first_unmatched_and_hint() {
        let actual = vec![rec(LogLevel::Info, "svc.start")];
        let expected = vec![info([]), debug([message("svc.stat")])];
        let outcome = SequenceOutcome::Missing {
            expectation: 1,
            matched: vec![0],
        };
        let text = failure_message(&actual, &expected, Some(&outcome), false);
        assert!(text.contains("first unmatched expectation [1] debug message=svc.stat (after 1 matched)"));
        assert!(text.contains("closest actual message: svc.start"));
    }

    #[test]
    fn closest_message_respects_distance_limit() {
        let actual = vec![rec(LogLevel::Info, "svc.start"), rec(LogLevel::Info, "other.thing")];
        assert_eq!(closest_message(&actual, "svc.strat"), Some("svc.start".to_owned()));
        assert_eq!(closest_message(&actual, "completely-different"), None);
        assert_eq!(closest_message(&actual, ""), None);
    }

    #[test]
    fn report_serializes_outcome() {
        let actual = vec![rec(LogLevel::Info, "svc.start")];
        let expected = vec![info([data("task", "t")])];
        let outcome = SequenceOutcome::Found { indices: vec![0] };
        let report = Report::new(&actual, &expected, Some(&outcome), false);
        assert!(report.passed);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["outcome"], "found");
        assert_eq!(json["outcome"]["indices"][0], 0);
        assert_eq!(json["expected"][0]["level"], 1);
        assert!(json.get("closest_message").is_none());

        let negated = Report::new(&actual, &expected, Some(&outcome), true);
        assert!(!negated.passed);
    }
}
