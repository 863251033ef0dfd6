//! Case lifecycle errors
//!
//! A case can fail in more than one place: a request error followed by a
//! failing teardown leaves two unrelated causes. [`CaseError`] keeps every
//! cause in the order it happened and lets callers ask for any of them.

use std::fmt;

use thiserror::Error;

use crate::fixture::FixtureError;
use crate::http::DispatchError;
use crate::verify::VerifyError;

/// Fixture phase of a database failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    SetUp,
    TearDown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::SetUp => f.write_str("set up"),
            Phase::TearDown => f.write_str("tear down"),
        }
    }
}

/// One cause of a case failure
#[derive(Error, Debug)]
pub enum Failure {
    #[error("tester: database error ({phase}). {source}")]
    Database {
        phase: Phase,
        #[source]
        source: FixtureError,
    },

    #[error("tester: request error. {0}")]
    Request(#[source] DispatchError),

    #[error("tester: reporter error. {0}")]
    Reporter(#[source] VerifyError),

    #[error("tester: assertion error. {0}")]
    Assertion(String),
}

/// Classification of a [`Failure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    DatabaseSetUp,
    DatabaseTearDown,
    Request,
    Reporter,
    Assertion,
}

impl Failure {
    pub fn set_up(source: FixtureError) -> Self {
        Self::Database {
            phase: Phase::SetUp,
            source,
        }
    }

    pub fn tear_down(source: FixtureError) -> Self {
        Self::Database {
            phase: Phase::TearDown,
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Database {
                phase: Phase::SetUp,
                ..
            } => FailureKind::DatabaseSetUp,
            Failure::Database {
                phase: Phase::TearDown,
                ..
            } => FailureKind::DatabaseTearDown,
            Failure::Request(_) => FailureKind::Request,
            Failure::Reporter(_) => FailureKind::Reporter,
            Failure::Assertion(_) => FailureKind::Assertion,
        }
    }
}

/// Every cause that made a case fail, oldest first
#[derive(Debug)]
pub struct CaseError {
    causes: Vec<Failure>,
}

impl CaseError {
    pub fn causes(&self) -> &[Failure] {
        &self.causes
    }

    /// Whether any cause is of `kind`
    pub fn is(&self, kind: FailureKind) -> bool {
        self.causes.iter().any(|cause| cause.kind() == kind)
    }

    /// Append a later cause
    pub fn push(&mut self, cause: Failure) {
        self.causes.push(cause);
    }
}

impl From<Failure> for CaseError {
    fn from(cause: Failure) -> Self {
        Self {
            causes: vec![cause],
        }
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cause) in self.causes.iter().enumerate() {
            if i > 0 {
                f.write_str(". ")?;
            }
            write!(f, "{}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for CaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes
            .first()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
