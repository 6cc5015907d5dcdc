//! Per-case run state
//!
//! Engine primitives return `Result<(), Failure>` so a scenario can chain
//! them with `?`. The first failure that reaches [`TestContext::record`] is
//! kept; everything after it is refused by [`TestContext::guard`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use super::reporter::CaseReport;
use crate::backend::{Handle, Session};

/// Outcome of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestState {
    Success,
    /// Assertions suspended; commands still run
    Skipping,
    CommandError,
    ConfigError,
    AssertError,
    CustomError,
    InternalError,
}

impl TestState {
    pub fn is_failure(self) -> bool {
        !matches!(self, TestState::Success | TestState::Skipping)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestState::Success => "SUCCESS",
            TestState::Skipping => "SKIPPING",
            TestState::CommandError => "COMMAND_ERROR",
            TestState::ConfigError => "CONFIG_ERROR",
            TestState::AssertError => "ASSERT_ERROR",
            TestState::CustomError => "CUSTOM_ERROR",
            TestState::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for TestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed engine step: the failure state and its message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Failure {
    pub state: TestState,
    pub message: String,
}

impl Failure {
    pub fn new(state: TestState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::new(TestState::CommandError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(TestState::ConfigError, message)
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(TestState::AssertError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(TestState::InternalError, message)
    }

    /// Re-tag a failure raised inside a custom validator
    pub fn into_custom(self) -> Self {
        Self::new(
            TestState::CustomError,
            format!("custom handler failed: {}", self.message),
        )
    }
}

/// Compare an observed value with the expected one
pub fn ensure_eq<T>(subject: &str, actual: T, expected: T) -> Result<(), Failure>
where
    T: PartialEq + fmt::Display,
{
    if actual == expected {
        Ok(())
    } else {
        Err(Failure::assertion(format!(
            "assertion failed: {}[{}] == [{}]",
            subject, actual, expected
        )))
    }
}

/// Mutable state of one running case, owning its configuration session
pub struct TestContext {
    session: Session,
    state: TestState,
    error: Option<String>,
    log: Vec<String>,
    member: Option<Handle>,
    group: Option<Handle>,
}

impl TestContext {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: TestState::Success,
            error: None,
            log: Vec::new(),
            member: None,
            group: None,
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_suspended(&self) -> bool {
        self.state == TestState::Skipping
    }

    /// Refuse to continue once a failure was recorded
    pub fn guard(&self) -> Result<(), Failure> {
        if self.state.is_failure() {
            Err(Failure::new(
                self.state,
                self.error.clone().unwrap_or_default(),
            ))
        } else {
            Ok(())
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        if self.state.is_failure() {
            return;
        }
        let message = message.into();
        debug!("{}", message);
        self.log.push(message);
    }

    /// Store a failure unless an earlier one is already stored
    pub fn record(&mut self, failure: Failure) {
        if self.state.is_failure() {
            trace!(ignored = %failure, "case already failed");
            return;
        }
        debug!(state = %failure.state, error = %failure.message, "case failed");
        self.state = failure.state;
        self.error = Some(failure.message);
    }

    /// Suspend assertions until [`TestContext::resume`]
    pub fn suspend(&mut self) {
        if self.state == TestState::Success {
            self.state = TestState::Skipping;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TestState::Skipping {
            self.state = TestState::Success;
        }
    }

    /// Run one configuration line
    pub fn execute(&mut self, line: &str) -> Result<(), Failure> {
        self.guard()?;
        if line.split_whitespace().next().is_none() {
            return Err(Failure::internal(format!(
                "tokenizing command string [{}] returned empty result",
                line
            )));
        }
        self.session.execute(line).map_err(|e| {
            debug!(command = line, error = %e, "command rejected");
            Failure::command(format!(
                "execution of command [{}] has failed with code [{}]",
                line,
                e.status.code()
            ))
        })
    }

    /// Check the rendered configuration for a fragment
    pub fn expect_config(&self, fragment: &str, present: bool) -> Result<(), Failure> {
        self.guard()?;
        if self.is_suspended() {
            return Ok(());
        }
        let matched = self.session.render_config().contains(fragment);
        match (matched, present) {
            (false, true) => Err(Failure::config(format!(
                "expected config [{}] to be present",
                fragment
            ))),
            (true, false) => Err(Failure::config(format!(
                "expected config [{}] to be absent",
                fragment
            ))),
            _ => Ok(()),
        }
    }

    /// Tear down all configuration and forget the handles
    pub fn reset(&mut self) {
        self.session.reset();
        self.member = None;
        self.group = None;
    }

    pub fn bind(&mut self, member: Handle, group: Handle) {
        self.member = Some(member);
        self.group = Some(group);
    }

    pub fn handles(&self) -> Result<(&Handle, &Handle), Failure> {
        match (&self.member, &self.group) {
            (Some(member), Some(group)) => Ok((member, group)),
            _ => Err(Failure::internal("test environment is not initialized")),
        }
    }

    /// Close the session and turn the context into its report
    pub fn finish(mut self, description: String) -> CaseReport {
        self.session.close();
        // a case never ends suspended
        let state = match self.state {
            TestState::Skipping => TestState::Success,
            state => state,
        };
        CaseReport {
            description,
            state,
            log: self.log,
            error: self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bgp::Vty;

    fn context() -> TestContext {
        TestContext::new(Session::open(Box::new(Vty::new())))
    }

    #[test]
    fn test_first_failure_sticks() {
        let mut ctx = context();
        ctx.record(Failure::config("first"));
        ctx.record(Failure::assertion("second"));
        assert_eq!(ctx.state(), TestState::ConfigError);
        assert_eq!(ctx.error(), Some("first"));

        let err = ctx.execute("router bgp 100").unwrap_err();
        assert_eq!(err, Failure::config("first"));
    }

    #[test]
    fn test_log_stops_after_failure() {
        let mut ctx = context();
        ctx.log("one");
        ctx.suspend();
        ctx.log("two");
        ctx.resume();
        ctx.record(Failure::internal("boom"));
        ctx.log("three");
        assert_eq!(ctx.log_lines(), ["one", "two"]);
    }

    #[test]
    fn test_command_failure_message() {
        let mut ctx = context();
        let err = ctx.execute("neighbor 1.1.1.1 passive").unwrap_err();
        assert_eq!(err.state, TestState::CommandError);
        assert_eq!(
            err.message,
            "execution of command [neighbor 1.1.1.1 passive] has failed with code [2]"
        );
    }

    #[test]
    fn test_empty_command_is_internal() {
        let mut ctx = context();
        let err = ctx.execute("   ").unwrap_err();
        assert_eq!(err.state, TestState::InternalError);
        assert!(err.message.starts_with("tokenizing command string"));
    }

    #[test]
    fn test_config_checks() {
        let mut ctx = context();
        ctx.execute("router bgp 100").unwrap();
        ctx.expect_config("router bgp 100", true).unwrap();
        let err = ctx.expect_config("router bgp 100", false).unwrap_err();
        assert_eq!(err.message, "expected config [router bgp 100] to be absent");
        let err = ctx.expect_config("router bgp 200", true).unwrap_err();
        assert_eq!(err.state, TestState::ConfigError);
    }

    #[test]
    fn test_suspend_skips_config_checks_but_runs_commands() {
        let mut ctx = context();
        ctx.suspend();
        ctx.execute("router bgp 100").unwrap();
        ctx.expect_config("router bgp 999", true).unwrap();
        ctx.resume();
        ctx.expect_config("router bgp 100", true).unwrap();
    }

    #[test]
    fn test_ensure_eq_message() {
        assert!(ensure_eq("member.value", true, true).is_ok());
        let err = ensure_eq("member.value", true, false).unwrap_err();
        assert_eq!(err.message, "assertion failed: member.value[true] == [false]");
        assert_eq!(err.into_custom().message, "custom handler failed: assertion failed: member.value[true] == [false]");
    }

    #[test]
    fn test_finish_reports_state() {
        let mut ctx = context();
        ctx.log("prepare");
        ctx.suspend();
        let report = ctx.finish("peer\\passive".into());
        assert_eq!(report.state, TestState::Success);
        assert_eq!(report.log, vec!["prepare"]);
        assert!(report.error.is_none());
    }
}
