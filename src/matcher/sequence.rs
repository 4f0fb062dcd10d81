//! Ordered log-sequence matching.
//!
//! [`ContainSequence`] decodes a record stream and checks that the expected
//! entries occur in it as an order-preserving subsequence: each expectation
//! is satisfied by the first record after the previous expectation's record
//! that contains it, and no record is used twice. The search never backtracks:
//! an earlier expectation keeps the first record that satisfied it even if a
//! later choice would have let the rest of the sequence match.

use std::any::Any;
use std::io::Read;

use serde::Serialize;
use serde_json::error::Category;

use crate::error::MatchError;
use crate::record::{Data, LogRecord, canonical_json};

use super::actual::{Actual, with_actual};
use super::entry::Expectation;
use super::report;

/// Result of one subsequence search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SequenceOutcome {
    /// Every expectation was satisfied; `indices[n]` is the record that
    /// satisfied expectation `n`.
    Found {
        /// Record index per expectation.
        indices: Vec<usize>,
    },
    /// Expectation `expectation` had no satisfying record after the cursor.
    Missing {
        /// Index of the first unsatisfied expectation.
        expectation: usize,
        /// Record indices of the expectations satisfied before it.
        matched: Vec<usize>,
    },
}

impl SequenceOutcome {
    /// Returns whether the whole sequence was found.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Matcher checking that a record stream contains an ordered sequence.
///
/// Every call to [`matches`](Self::matches) decodes its source afresh: a
/// buffer is re-read in full each time, so repeated checks agree, while a
/// forward-only stream yields only what earlier checks left unread.
#[derive(Debug, Clone, Default)]
pub struct ContainSequence {
    expected: Vec<Expectation>,
    actual: Vec<LogRecord>,
    outcome: Option<SequenceOutcome>,
}

/// Creates a matcher for the given expected sequence.
pub fn contain_sequence(expected: impl IntoIterator<Item = Expectation>) -> ContainSequence {
    ContainSequence::new(expected)
}

impl ContainSequence {
    /// Creates a matcher for the given expected sequence.
    pub fn new(expected: impl IntoIterator<Item = Expectation>) -> Self {
        Self {
            expected: expected.into_iter().collect(),
            actual: Vec::new(),
            outcome: None,
        }
    }

    /// Decodes `actual` and searches it for the expected sequence.
    ///
    /// `Ok(false)` means the records were read fine but the sequence is not
    /// in them.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Decode`] if a record is malformed and
    /// [`MatchError::Io`] if reading fails. Either aborts the attempt.
    pub fn matches<A: Actual + ?Sized>(&mut self, actual: &mut A) -> Result<bool, MatchError> {
        self.actual.clear();
        self.outcome = None;

        self.actual = decode_records(actual.open()?)?;
        let outcome = find_sequence(&self.actual, &self.expected);
        let found = outcome.is_found();
        self.outcome = Some(outcome);
        Ok(found)
    }

    /// Like [`matches`](Self::matches), for a value whose type is only known
    /// at run time.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::UnsupportedSource`] if `actual` is not a
    /// supported source type, plus everything [`matches`](Self::matches)
    /// returns.
    pub fn matches_any<T: Any>(&mut self, actual: &mut T) -> Result<bool, MatchError> {
        with_actual(actual, |a| self.matches(a))?
    }

    /// Expected sequence.
    #[must_use]
    pub fn expected(&self) -> &[Expectation] {
        &self.expected
    }

    /// Records decoded by the last match attempt.
    #[must_use]
    pub fn actual(&self) -> &[LogRecord] {
        &self.actual
    }

    /// Outcome of the last match attempt, if it got as far as searching.
    #[must_use]
    pub const fn outcome(&self) -> Option<&SequenceOutcome> {
        self.outcome.as_ref()
    }

    /// Report for a failed positive assertion.
    #[must_use]
    pub fn failure_message(&self) -> String {
        report::failure_message(&self.actual, &self.expected, self.outcome.as_ref(), false)
    }

    /// Report for a failed negated assertion.
    #[must_use]
    pub fn negated_failure_message(&self) -> String {
        report::failure_message(&self.actual, &self.expected, self.outcome.as_ref(), true)
    }
}

/// Decodes back-to-back JSON records until the end of `reader`.
///
/// Records may be separated by whitespace or simply concatenated. A bare
/// `null` decodes as an empty record.
///
/// # Errors
///
/// Returns [`MatchError::Decode`] at the first malformed record and
/// [`MatchError::Io`] if reading fails.
pub fn decode_records(reader: impl Read) -> Result<Vec<LogRecord>, MatchError> {
    serde_json::Deserializer::from_reader(reader)
        .into_iter::<Option<LogRecord>>()
        .map(|record| {
            record.map(Option::unwrap_or_default).map_err(|e| match e.classify() {
                Category::Io => MatchError::Io(e.into()),
                _ => MatchError::Decode(e),
            })
        })
        .collect()
}

/// Searches `actual` for `expected` as an order-preserving subsequence.
#[must_use]
pub fn find_sequence(actual: &[LogRecord], expected: &[Expectation]) -> SequenceOutcome {
    let mut cursor = 0;
    let mut indices = Vec::with_capacity(expected.len());

    for (n, expectation) in expected.iter().enumerate() {
        let Some(offset) = actual[cursor..].iter().position(|r| r.contains(expectation)) else {
            return SequenceOutcome::Missing {
                expectation: n,
                matched: indices,
            };
        };
        let index = cursor + offset;
        indices.push(index);
        cursor = index + 1;
    }

    SequenceOutcome::Found { indices }
}

impl LogRecord {
    /// Returns whether this record satisfies `expected`.
    ///
    /// Source and message are compared only when the expectation sets them;
    /// the level always is. Every expected data entry must be present with a
    /// value of the same canonical JSON form.
    #[must_use]
    pub fn contains(&self, expected: &Expectation) -> bool {
        if !expected.source.is_empty() && self.source != expected.source {
            return false;
        }
        if !expected.message.is_empty() && self.message != expected.message {
            return false;
        }
        if self.level != expected.level {
            return false;
        }
        data_contains(&self.data, &expected.data)
    }
}

fn data_contains(actual: &Data, expected: &Data) -> bool {
    expected.iter().all(|(key, want)| {
        actual
            .get(key)
            .is_some_and(|got| got == want || canonical_json(got) == canonical_json(want))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::entry::{ANY_ERR, data, debug, error, fatal, info, message, source};
    use crate::record::LogLevel;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("some-error")]
    struct SomeError;

    fn record(level: LogLevel, msg: &str, data: Data) -> LogRecord {
        LogRecord {
            timestamp: "0.000000000".to_owned(),
            source: "logger".to_owned(),
            message: msg.to_owned(),
            level: level.into(),
            data,
            error: None,
        }
    }

    fn sample() -> Vec<LogRecord> {
        vec![
            record(LogLevel::Info, "logger.action", Data::from([("event", "starting"), ("task", "my-task")])),
            record(LogLevel::Debug, "logger.action", Data::from([("event", "debugging"), ("task", "my-task")])),
            record(
                LogLevel::Error,
                "logger.action",
                Data::from([("event", "failed"), ("task", "my-task"), ("error", "some-error")]),
            ),
        ]
    }

    fn ndjson(records: &[LogRecord]) -> String {
        records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap() + "\n")
            .collect()
    }

    #[test]
    fn finds_sequence_in_order() {
        let outcome = find_sequence(
            &sample(),
            &[
                info([data("event", "starting")]),
                debug([data("event", "debugging")]),
                error(Some(&SomeError), [data("event", "failed")]),
            ],
        );
        assert_eq!(outcome, SequenceOutcome::Found { indices: vec![0, 1, 2] });
    }

    #[test]
    fn skips_unrelated_records() {
        let outcome = find_sequence(&sample(), &[info([]), error(Some(&SomeError), [])]);
        assert_eq!(outcome, SequenceOutcome::Found { indices: vec![0, 2] });
    }

    #[test]
    fn out_of_order_is_missing() {
        let outcome = find_sequence(
            &sample(),
            &[debug([]), error(Some(&SomeError), []), info([])],
        );
        assert_eq!(
            outcome,
            SequenceOutcome::Missing {
                expectation: 2,
                matched: vec![1, 2]
            }
        );
    }

    #[test]
    fn records_are_not_reused() {
        let outcome = find_sequence(&sample(), &[info([]), info([])]);
        assert!(!outcome.is_found());
    }

    #[test]
    fn empty_expectation_always_matches() {
        assert!(find_sequence(&[], &[]).is_found());
        assert!(find_sequence(&sample(), &[]).is_found());
    }

    #[test]
    fn level_is_always_compared() {
        let records = sample();
        assert!(!records[2].contains(&fatal(Some(&SomeError), [data("event", "failed")])));
        assert!(!records[0].contains(&debug([data("event", "starting")])));
    }

    #[test]
    fn empty_source_and_message_are_wildcards() {
        let records = sample();
        assert!(records[0].contains(&info([])));
        assert!(records[0].contains(&info([source("logger"), message("logger.action")])));
        assert!(!records[0].contains(&info([source("other")])));
        assert!(!records[0].contains(&info([message("logger.other")])));
    }

    #[test]
    fn data_requires_every_expected_key() {
        let records = sample();
        assert!(records[0].contains(&info([data("task", "my-task")])));
        assert!(!records[0].contains(&info([data("missing", "x")])));
        assert!(!records[0].contains(&info([data("task", "other")])));
    }

    #[test]
    fn data_compares_canonical_forms() {
        let r = record(LogLevel::Info, "m", Data::from([("n", json!(1)), ("o", json!({"a": 1, "b": [2.0]}))]));
        assert!(r.contains(&info([data("n", 1.0)])));
        assert!(r.contains(&info([data("n", 1_u64)])));
        assert!(r.contains(&info([data("o", json!({"b": [2], "a": 1.0}))])));
        assert!(!r.contains(&info([data("n", "1")])));
    }

    #[test]
    fn decodes_newline_delimited_and_concatenated_records() {
        let records = sample();
        let text = ndjson(&records);
        assert_eq!(decode_records(text.as_bytes()).unwrap(), records);

        let packed: String = text.lines().collect();
        assert_eq!(decode_records(packed.as_bytes()).unwrap(), records);
    }

    #[test]
    fn decodes_unknown_level_and_null_records() {
        let records = decode_records(&b"null {\"log_level\":9,\"message\":\"m\"}"[..]).unwrap();
        assert_eq!(records[0], LogRecord::default());
        assert_eq!(records[1].level, crate::record::RecordLevel::Other(9));
        assert!(!records[1].contains(&fatal(ANY_ERR, [])));
    }

    #[test]
    fn decode_error_aborts() {
        let mut text = ndjson(&sample());
        text.push_str("{\"log_level\": 1,");
        let err = decode_records(text.as_bytes()).unwrap_err();
        assert!(matches!(err, MatchError::Decode(_)));
    }

    #[test]
    fn matcher_remembers_decoded_records_and_outcome() {
        let mut text = ndjson(&sample());
        let mut matcher = contain_sequence([info([]), info([])]);
        assert!(!matcher.matches(&mut text).unwrap());
        assert_eq!(matcher.actual().len(), 3);
        assert_eq!(
            matcher.outcome(),
            Some(&SequenceOutcome::Missing {
                expectation: 1,
                matched: vec![0]
            })
        );
    }

    #[test]
    fn decode_error_surfaces_from_matcher() {
        let mut text = String::from("{not json}");
        let mut matcher = contain_sequence([info([])]);
        assert!(matches!(matcher.matches(&mut text), Err(MatchError::Decode(_))));
        assert!(matcher.outcome().is_none());
    }

    #[test]
    fn matches_any_rejects_unsupported_types() {
        let mut matcher = contain_sequence([info([])]);
        let err = matcher.matches_any(&mut 3.5_f64).unwrap_err();
        assert!(err.to_string().contains("f64"));
    }
}
