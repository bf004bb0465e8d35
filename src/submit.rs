use std::env;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use reqwest::Url;

use crate::record::JobApplicationRecord;
use crate::sanitize::sanitize_record;

/// Shown when a submission fails without a usable message of its own.
pub const FALLBACK_ERROR: &str = "An error occurred";

const ENDPOINT_ENV: &str = "APPLY_SUBMIT_URL";

// --- Submission boundary ---

/// Where finished applications go. The form only ever sees this trait, so
/// swapping the real endpoint for a stub (or a test double) is one line.
pub trait SubmissionBoundary {
    fn deliver(&self, record: &JobApplicationRecord) -> Result<()>;
    fn describe(&self) -> String;
}

/// Stand-in boundary until a real endpoint exists: logs the payload and
/// accepts it.
pub struct LogBoundary;

impl SubmissionBoundary for LogBoundary {
    fn deliver(&self, record: &JobApplicationRecord) -> Result<()> {
        let payload = serde_json::to_string(record).context("Failed to encode application")?;
        info!("submission accepted by logging stub: {payload}");
        Ok(())
    }

    fn describe(&self) -> String {
        "logging stub".to_string()
    }
}

/// POSTs the record as JSON to a configured endpoint.
pub struct HttpBoundary {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpBoundary {
    pub fn new(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)
            .with_context(|| format!("Invalid submission endpoint '{endpoint}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Submission endpoint must be http or https, got '{endpoint}'");
        }
        Ok(Self { endpoint: url.to_string(), client: reqwest::blocking::Client::new() })
    }
}

impl SubmissionBoundary for HttpBoundary {
    fn deliver(&self, record: &JobApplicationRecord) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .context("Failed to reach submission endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("Submission endpoint returned {}: {}", status, body));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("endpoint {}", self.endpoint)
    }
}

/// Pick a boundary: an explicit endpoint wins, then the APPLY_SUBMIT_URL
/// environment variable, then the logging stub.
pub fn boundary_for(endpoint: Option<&str>) -> Result<Box<dyn SubmissionBoundary>> {
    if let Some(endpoint) = endpoint {
        return Ok(Box::new(HttpBoundary::new(endpoint)?));
    }
    if let Ok(endpoint) = env::var(ENDPOINT_ENV) {
        return Ok(Box::new(HttpBoundary::new(&endpoint)?));
    }
    Ok(Box::new(LogBoundary))
}

// --- Controller ---

/// Drives one submission at a time: sanitize, hand off, settle. Keeps the
/// in-flight flag, an attempt counter, and the last failure message.
pub struct SubmissionController {
    boundary: Box<dyn SubmissionBoundary>,
    submitting: bool,
    attempt: u64,
    last_error: Option<String>,
}

impl SubmissionController {
    pub fn new(boundary: Box<dyn SubmissionBoundary>) -> Self {
        Self { boundary, submitting: false, attempt: 0, last_error: None }
    }

    /// Sanitize the record, deliver it, and record the outcome. On success
    /// the sanitized record that crossed the boundary is returned; on
    /// failure the error is retained for display and also rethrown.
    pub fn submit(&mut self, record: &JobApplicationRecord) -> Result<JobApplicationRecord> {
        let Some(token) = self.begin() else {
            debug!("submit ignored, attempt {} still in flight", self.attempt);
            bail!("A submission is already in progress");
        };
        let clean = sanitize_record(record);
        match self.boundary.deliver(&clean) {
            Ok(()) => {
                self.settle(token, None);
                Ok(clean)
            }
            Err(err) => {
                self.settle(token, Some(display_message(&err)));
                Err(err)
            }
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Dismiss the retained failure message without retrying.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn boundary_name(&self) -> String {
        self.boundary.describe()
    }

    /// Open a new attempt, or None while one is already in flight. Starting
    /// an attempt clears the previous failure message.
    fn begin(&mut self) -> Option<u64> {
        if self.submitting {
            return None;
        }
        self.attempt += 1;
        self.submitting = true;
        self.last_error = None;
        Some(self.attempt)
    }

    /// Record an attempt's outcome, unless a newer attempt has superseded it.
    fn settle(&mut self, token: u64, error: Option<String>) {
        if token != self.attempt {
            return;
        }
        self.submitting = false;
        self.last_error = error;
    }
}

fn display_message(err: &anyhow::Error) -> String {
    let message = err.to_string();
    if message.trim().is_empty() { FALLBACK_ERROR.to_string() } else { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Test boundary that records every delivered payload and can be told
    /// to fail with a given message.
    struct RecordingBoundary {
        seen: Rc<RefCell<Vec<JobApplicationRecord>>>,
        failure: Option<String>,
    }

    impl RecordingBoundary {
        fn accepting() -> (Self, Rc<RefCell<Vec<JobApplicationRecord>>>) {
            let seen = Rc::new(RefCell::new(Vec::new()));
            (Self { seen: Rc::clone(&seen), failure: None }, seen)
        }

        fn failing(message: &str) -> Self {
            Self { seen: Rc::new(RefCell::new(Vec::new())), failure: Some(message.to_string()) }
        }
    }

    impl SubmissionBoundary for RecordingBoundary {
        fn deliver(&self, record: &JobApplicationRecord) -> Result<()> {
            self.seen.borrow_mut().push(record.clone());
            match &self.failure {
                Some(message) => Err(anyhow!("{}", message)),
                None => Ok(()),
            }
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn record_with_markup() -> JobApplicationRecord {
        let mut record = JobApplicationRecord::default();
        record.role_title = "<b>Senior</b> Engineer".to_string();
        record.company_name = "Acme".to_string();
        record
    }

    #[test]
    fn test_submit_delivers_sanitized_record() {
        let (boundary, seen) = RecordingBoundary::accepting();
        let mut controller = SubmissionController::new(Box::new(boundary));

        let clean = controller.submit(&record_with_markup()).unwrap();
        assert_eq!(clean.role_title, "Senior Engineer");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role_title, "Senior Engineer");
        assert!(controller.last_error().is_none());
        assert!(!controller.is_submitting());
        assert_eq!(controller.attempt, 1);
    }

    #[test]
    fn test_failure_is_retained_and_rethrown() {
        let boundary = RecordingBoundary::failing("endpoint down");
        let mut controller = SubmissionController::new(Box::new(boundary));

        let err = controller.submit(&record_with_markup()).unwrap_err();
        assert_eq!(err.to_string(), "endpoint down");
        assert_eq!(controller.last_error(), Some("endpoint down"));
        assert!(!controller.is_submitting());
    }

    #[test]
    fn test_blank_failure_message_gets_fallback() {
        let boundary = RecordingBoundary::failing("   ");
        let mut controller = SubmissionController::new(Box::new(boundary));

        controller.submit(&record_with_markup()).unwrap_err();
        assert_eq!(controller.last_error(), Some(FALLBACK_ERROR));
    }

    #[test]
    fn test_new_attempt_clears_previous_error() {
        let boundary = RecordingBoundary::failing("endpoint down");
        let mut controller = SubmissionController::new(Box::new(boundary));
        controller.submit(&record_with_markup()).unwrap_err();
        assert!(controller.last_error().is_some());

        controller.boundary = Box::new(RecordingBoundary::accepting().0);
        controller.submit(&record_with_markup()).unwrap();
        assert!(controller.last_error().is_none());
        assert_eq!(controller.attempt, 2);
    }

    #[test]
    fn test_clear_error_dismisses_message() {
        let boundary = RecordingBoundary::failing("endpoint down");
        let mut controller = SubmissionController::new(Box::new(boundary));
        controller.submit(&record_with_markup()).unwrap_err();

        controller.clear_error();
        assert!(controller.last_error().is_none());
    }

    #[test]
    fn test_begin_refuses_overlapping_attempts() {
        let (boundary, _) = RecordingBoundary::accepting();
        let mut controller = SubmissionController::new(Box::new(boundary));

        let token = controller.begin().unwrap();
        assert_eq!(token, 1);
        assert!(controller.is_submitting());

        // a second begin while in flight is refused and does not burn a token
        assert!(controller.begin().is_none());
        assert_eq!(controller.attempt, 1);

        controller.settle(token, None);
        assert!(!controller.is_submitting());
        assert_eq!(controller.begin(), Some(2));
    }

    #[test]
    fn test_settle_ignores_stale_tokens() {
        let (boundary, _) = RecordingBoundary::accepting();
        let mut controller = SubmissionController::new(Box::new(boundary));

        let token = controller.begin().unwrap();
        controller.settle(token - 1, Some("old news".to_string()));
        assert!(controller.is_submitting());
        assert!(controller.last_error().is_none());

        controller.settle(token, None);
        assert!(!controller.is_submitting());
    }

    #[test]
    fn test_log_boundary_accepts() {
        let boundary = LogBoundary;
        assert!(boundary.deliver(&record_with_markup()).is_ok());
        assert_eq!(boundary.describe(), "logging stub");
    }

    #[test]
    fn test_http_boundary_rejects_bad_endpoints() {
        assert!(HttpBoundary::new("ftp://submit.example").is_err());
        assert!(HttpBoundary::new("not a url").is_err());
        assert!(HttpBoundary::new("https://submit.example/applications").is_ok());
    }

    #[test]
    fn test_boundary_for_prefers_explicit_endpoint() {
        let boundary = boundary_for(Some("https://submit.example/applications")).unwrap();
        assert!(boundary.describe().contains("submit.example"));
    }

    #[test]
    fn test_boundary_for_falls_back_to_stub() {
        let saved = env::var(ENDPOINT_ENV).ok();
        unsafe { env::remove_var(ENDPOINT_ENV) };

        let boundary = boundary_for(None).unwrap();
        assert_eq!(boundary.describe(), "logging stub");

        if let Some(value) = saved {
            unsafe { env::set_var(ENDPOINT_ENV, value) };
        }
    }
}
