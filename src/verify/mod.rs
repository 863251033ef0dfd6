//! Response verification
//!
//! Compares what the server answered against what the case expects. A
//! mismatch is an outcome, not an error: the only verification error is a
//! response body that cannot be decoded as JSON.

mod report;

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::cases::{Case, Headers};
use crate::http::ActualResponse;

pub use report::{ConsoleReporter, Reporter};

/// Header names excluded from comparison by default
pub const DEFAULT_EXCLUDED_HEADERS: &[&str] = &["Date", "Content-Length"];

/// Failure to interpret the actual response
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("response body is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

/// How expected headers are matched against the response
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// Both header maps must be equal
    #[default]
    Exact,
    /// Every expected header must be present with the same values
    Subset,
}

/// One field that differs from the expectation
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Code { expected: u16, actual: u16 },
    Body { expected: Value, actual: Value },
    Header { expected: Headers, actual: Headers },
}

impl Mismatch {
    /// Name of the mismatching field
    pub fn field(&self) -> &'static str {
        match self {
            Mismatch::Code { .. } => "code",
            Mismatch::Body { .. } => "body",
            Mismatch::Header { .. } => "header",
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Code { expected, actual } => {
                write!(f, "code: expected {}, actual {}", expected, actual)
            }
            Mismatch::Body { expected, actual } => {
                write!(f, "body: expected {}, actual {}", expected, actual)
            }
            Mismatch::Header { expected, actual } => {
                write!(f, "header: expected {:?}, actual {:?}", expected, actual)
            }
        }
    }
}

/// Pass/fail outcome of one case
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub case: String,
    pub mismatches: Vec<Mismatch>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// One-line description of the mismatching fields
    pub fn summary(&self) -> String {
        if self.passed() {
            return "all fields match".to_string();
        }
        let fields: Vec<_> = self.mismatches.iter().map(Mismatch::field).collect();
        format!("mismatch on {}", fields.join(", "))
    }
}

/// Compares actual responses against case expectations
#[derive(Debug, Clone)]
pub struct Verifier {
    /// Lower-cased names of excluded headers
    excluded: BTreeSet<String>,
    header_mode: HeaderMode,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_HEADERS.iter().copied())
    }
}

impl Verifier {
    /// Create a verifier ignoring the given header names
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: excluded
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
            header_mode: HeaderMode::default(),
        }
    }

    pub fn with_header_mode(mut self, mode: HeaderMode) -> Self {
        self.header_mode = mode;
        self
    }

    /// Verify `actual` against the expectation of `case`
    pub fn verify(&self, case: &Case, actual: &ActualResponse) -> Result<Verdict, VerifyError> {
        let expected = &case.response;
        let body: Value = serde_json::from_slice(&actual.body).map_err(VerifyError::Decode)?;

        let mut mismatches = Vec::new();

        if expected.code != actual.status {
            mismatches.push(Mismatch::Code {
                expected: expected.code,
                actual: actual.status,
            });
        }

        if !json_eq(&expected.body, &body) {
            mismatches.push(Mismatch::Body {
                expected: expected.body.clone(),
                actual: body,
            });
        }

        let expected_headers = self.comparable(&expected.headers);
        let actual_headers = self.comparable(&actual.headers);
        let headers_match = match self.header_mode {
            HeaderMode::Exact => expected_headers == actual_headers,
            HeaderMode::Subset => expected_headers
                .iter()
                .all(|(name, values)| actual_headers.get(name) == Some(values)),
        };
        if !headers_match {
            mismatches.push(Mismatch::Header {
                expected: expected_headers,
                actual: actual_headers,
            });
        }

        Ok(Verdict {
            case: case.name.clone(),
            mismatches,
        })
    }

    /// Lower-case header names and drop excluded ones
    fn comparable(&self, headers: &Headers) -> Headers {
        let mut out = Headers::new();
        for (name, values) in headers {
            let name = name.to_ascii_lowercase();
            if self.excluded.contains(&name) {
                continue;
            }
            out.entry(name).or_default().extend(values.iter().cloned());
        }
        out
    }
}

/// Structural equality of JSON values
///
/// Numbers compare as `f64`, object key order is irrelevant, array order
/// is significant.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, l)| y.get(key).is_some_and(|r| json_eq(l, r)))
        }
        _ => a == b,
    }
}
