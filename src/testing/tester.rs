//! Per-case lifecycle
//!
//! Every case runs SETUP → REQUEST → VERIFY → TEARDOWN. The first three
//! phases live in one inner future; teardown runs once that future has
//! finished, however it finished.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::cases::Case;
use crate::fixture::FixtureExecutor;
use crate::http::RequestDispatcher;
use crate::verify::{Reporter, Verdict, Verifier};

use super::error::{CaseError, Failure};

/// Runs the lifecycle of one case against its collaborators
pub struct CaseTester {
    executor: Arc<dyn FixtureExecutor>,
    dispatcher: Arc<dyn RequestDispatcher>,
    verifier: Verifier,
    reporter: Arc<dyn Reporter>,
    strict: bool,
}

impl CaseTester {
    pub fn new(
        executor: Arc<dyn FixtureExecutor>,
        dispatcher: Arc<dyn RequestDispatcher>,
        verifier: Verifier,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            executor,
            dispatcher,
            verifier,
            reporter,
            strict: false,
        }
    }

    /// Escalate response mismatches to case errors
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Test one case
    ///
    /// The teardown fixture runs exactly once, after set up has been
    /// attempted, whether the earlier phases succeeded, failed or panicked.
    pub async fn test(&self, case: &Case) -> Result<Verdict, CaseError> {
        tracing::debug!(case = %case.name, "Testing case");

        let outcome = AssertUnwindSafe(self.exercise(case)).catch_unwind().await;

        tracing::debug!(case = %case.name, "Tearing down");
        let teardown = self.executor.execute(&case.database.tear_down).await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                if let Err(e) = &teardown {
                    tracing::error!(case = %case.name, "Teardown failed after panic: {}", e);
                }
                std::panic::resume_unwind(panic);
            }
        };

        match (outcome, teardown) {
            (Ok(verdict), Ok(())) => Ok(verdict),
            (Ok(_), Err(e)) => Err(Failure::tear_down(e).into()),
            (Err(err), Ok(())) => Err(err),
            (Err(mut err), Err(e)) => {
                err.push(Failure::tear_down(e));
                Err(err)
            }
        }
    }

    /// Set up, request and verify
    async fn exercise(&self, case: &Case) -> Result<Verdict, CaseError> {
        tracing::debug!(case = %case.name, "Setting up");
        self.executor
            .execute(&case.database.set_up)
            .await
            .map_err(Failure::set_up)?;

        tracing::debug!(case = %case.name, "Sending request");
        let response = self
            .dispatcher
            .send(&case.request)
            .await
            .map_err(Failure::Request)?;

        let verdict = self
            .verifier
            .verify(case, &response)
            .map_err(Failure::Reporter)?;
        self.reporter.report(&verdict);

        if !verdict.passed() {
            tracing::warn!(case = %case.name, "{}", verdict.summary());
            if self.strict {
                return Err(Failure::Assertion(verdict.summary()).into());
            }
        }

        Ok(verdict)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cases::{ExpectedResponse, Fixture};
    use crate::fixture::FixtureError;
    use crate::http::{ActualResponse, DispatchError};
    use crate::testing::FailureKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Executor recording every call, failing for configured statement lists
    #[derive(Default)]
    pub(crate) struct FakeExecutor {
        pub calls: Mutex<Vec<Vec<String>>>,
        pub failures: HashMap<Vec<String>, FixtureError>,
    }

    impl FakeExecutor {
        pub fn failing(statements: &[&str], error: FixtureError) -> Self {
            let mut failures = HashMap::new();
            failures.insert(statements.iter().map(|s| s.to_string()).collect(), error);
            Self {
                calls: Mutex::new(Vec::new()),
                failures,
            }
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FixtureExecutor for FakeExecutor {
        async fn execute(&self, statements: &[String]) -> Result<(), FixtureError> {
            self.calls.lock().unwrap().push(statements.to_vec());
            match self.failures.get(statements) {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    /// Dispatcher returning a canned result
    pub(crate) struct FakeDispatcher {
        pub result: Result<ActualResponse, DispatchError>,
        pub calls: Mutex<usize>,
    }

    impl FakeDispatcher {
        pub fn responding(response: ActualResponse) -> Self {
            Self {
                result: Ok(response),
                calls: Mutex::new(0),
            }
        }

        pub fn failing(error: DispatchError) -> Self {
            Self {
                result: Err(error),
                calls: Mutex::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl RequestDispatcher for FakeDispatcher {
        async fn send(&self, _request: &crate::cases::Request) -> Result<ActualResponse, DispatchError> {
            *self.calls.lock().unwrap() += 1;
            self.result.clone()
        }
    }

    /// Dispatcher that panics
    struct PanickingDispatcher;

    #[async_trait]
    impl RequestDispatcher for PanickingDispatcher {
        async fn send(&self, _request: &crate::cases::Request) -> Result<ActualResponse, DispatchError> {
            panic!("dispatcher exploded");
        }
    }

    /// Reporter collecting verdicts
    #[derive(Default)]
    pub(crate) struct FakeReporter {
        pub verdicts: Mutex<Vec<Verdict>>,
    }

    impl FakeReporter {
        pub fn verdicts(&self) -> Vec<Verdict> {
            self.verdicts.lock().unwrap().clone()
        }
    }

    impl Reporter for FakeReporter {
        fn report(&self, verdict: &Verdict) {
            self.verdicts.lock().unwrap().push(verdict.clone());
        }
    }

    fn sample_case() -> Case {
        Case {
            name: "c1".to_string(),
            database: Fixture {
                set_up: vec!["query 1".to_string(), "query 2".to_string()],
                tear_down: vec!["query 3".to_string(), "query 4".to_string()],
            },
            response: ExpectedResponse {
                code: 200,
                body: json!({"ok": true}),
                ..ExpectedResponse::default()
            },
            ..Case::default()
        }
    }

    fn set_up() -> Vec<String> {
        vec!["query 1".to_string(), "query 2".to_string()]
    }

    fn tear_down() -> Vec<String> {
        vec!["query 3".to_string(), "query 4".to_string()]
    }

    fn ok_response() -> ActualResponse {
        ActualResponse::new(200, r#"{"ok":true}"#)
    }

    fn tester(
        executor: &Arc<FakeExecutor>,
        dispatcher: Arc<dyn RequestDispatcher>,
        reporter: &Arc<FakeReporter>,
    ) -> CaseTester {
        CaseTester::new(
            executor.clone(),
            dispatcher,
            Verifier::default(),
            reporter.clone(),
        )
    }

    #[tokio::test]
    async fn test_success() {
        let executor = Arc::new(FakeExecutor::default());
        let dispatcher = Arc::new(FakeDispatcher::responding(ok_response()));
        let reporter = Arc::new(FakeReporter::default());

        let verdict = tester(&executor, dispatcher.clone(), &reporter)
            .test(&sample_case())
            .await
            .unwrap();

        assert!(verdict.passed());
        assert_eq!(executor.calls(), vec![set_up(), tear_down()]);
        assert_eq!(dispatcher.calls(), 1);
        assert_eq!(reporter.verdicts(), vec![verdict]);
    }

    #[tokio::test]
    async fn test_set_up_failure_still_tears_down() {
        let executor = Arc::new(FakeExecutor::failing(
            &["query 1", "query 2"],
            FixtureError::statement(1, "dbexecuter: internal error"),
        ));
        let dispatcher = Arc::new(FakeDispatcher::responding(ok_response()));
        let reporter = Arc::new(FakeReporter::default());

        let err = tester(&executor, dispatcher.clone(), &reporter)
            .test(&sample_case())
            .await
            .unwrap_err();

        assert!(err.is(FailureKind::DatabaseSetUp));
        assert_eq!(err.causes().len(), 1);
        assert!(err.to_string().contains("dbexecuter: internal error"));
        assert_eq!(executor.calls(), vec![set_up(), tear_down()]);
        assert_eq!(dispatcher.calls(), 0);
        assert!(reporter.verdicts().is_empty());
    }

    #[tokio::test]
    async fn test_tear_down_failure_alone() {
        let executor = Arc::new(FakeExecutor::failing(
            &["query 3", "query 4"],
            FixtureError::statement(0, "dbexecuter: internal error"),
        ));
        let dispatcher = Arc::new(FakeDispatcher::responding(ok_response()));
        let reporter = Arc::new(FakeReporter::default());

        let err = tester(&executor, dispatcher, &reporter)
            .test(&sample_case())
            .await
            .unwrap_err();

        assert!(err.is(FailureKind::DatabaseTearDown));
        assert!(!err.is(FailureKind::DatabaseSetUp));
        assert_eq!(err.causes().len(), 1);
        assert_eq!(reporter.verdicts().len(), 1);
    }

    #[tokio::test]
    async fn test_request_failure() {
        let executor = Arc::new(FakeExecutor::default());
        let dispatcher = Arc::new(FakeDispatcher::failing(DispatchError::Transport(
            "requester: internal error".to_string(),
        )));
        let reporter = Arc::new(FakeReporter::default());

        let err = tester(&executor, dispatcher, &reporter)
            .test(&sample_case())
            .await
            .unwrap_err();

        assert!(err.is(FailureKind::Request));
        assert_eq!(
            err.to_string(),
            "tester: request error. request failed: requester: internal error"
        );
        assert_eq!(executor.calls(), vec![set_up(), tear_down()]);
        assert!(reporter.verdicts().is_empty());
    }

    #[tokio::test]
    async fn test_reporter_and_tear_down_failure_are_combined() {
        let executor = Arc::new(FakeExecutor::failing(
            &["query 3", "query 4"],
            FixtureError::statement(0, "dbexecuter: internal error"),
        ));
        let dispatcher = Arc::new(FakeDispatcher::responding(ActualResponse::new(200, "not json")));
        let reporter = Arc::new(FakeReporter::default());

        let err = tester(&executor, dispatcher, &reporter)
            .test(&sample_case())
            .await
            .unwrap_err();

        assert!(err.is(FailureKind::Reporter));
        assert!(err.is(FailureKind::DatabaseTearDown));
        let message = err.to_string();
        assert!(message.contains("tester: reporter error"));
        assert!(message.contains("response body is not valid JSON"));
        assert!(message.contains("tester: database error (tear down)"));
        assert!(message.contains("dbexecuter: internal error"));
        assert_eq!(executor.calls(), vec![set_up(), tear_down()]);
    }

    #[tokio::test]
    async fn test_mismatch_is_not_an_error() {
        let executor = Arc::new(FakeExecutor::default());
        let dispatcher = Arc::new(FakeDispatcher::responding(ActualResponse::new(500, r#"{"ok":true}"#)));
        let reporter = Arc::new(FakeReporter::default());

        let verdict = tester(&executor, dispatcher, &reporter)
            .test(&sample_case())
            .await
            .unwrap();

        assert!(!verdict.passed());
        assert_eq!(verdict.mismatches[0].field(), "code");
        assert_eq!(reporter.verdicts().len(), 1);
    }

    #[tokio::test]
    async fn test_strict_mismatch_is_an_error() {
        let executor = Arc::new(FakeExecutor::default());
        let dispatcher = Arc::new(FakeDispatcher::responding(ActualResponse::new(500, r#"{"ok":true}"#)));
        let reporter = Arc::new(FakeReporter::default());

        let err = tester(&executor, dispatcher, &reporter)
            .strict(true)
            .test(&sample_case())
            .await
            .unwrap_err();

        assert!(err.is(FailureKind::Assertion));
        assert_eq!(executor.calls(), vec![set_up(), tear_down()]);
        assert_eq!(reporter.verdicts().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_still_tears_down() {
        let executor = Arc::new(FakeExecutor::default());
        let reporter = Arc::new(FakeReporter::default());
        let case_tester = tester(&executor, Arc::new(PanickingDispatcher), &reporter);
        let case = sample_case();

        let result = AssertUnwindSafe(case_tester.test(&case)).catch_unwind().await;

        assert!(result.is_err());
        assert_eq!(executor.calls(), vec![set_up(), tear_down()]);
    }
}
