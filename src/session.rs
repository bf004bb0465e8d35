use std::collections::{HashMap, HashSet};

use anyhow::Result;

use crate::draft::DraftStore;
use crate::record::{FieldId, JobApplicationRecord};
use crate::rules::{check_field, validate, Issue};
use crate::submit::SubmissionController;

/// Where a field sits in the check lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckPhase {
    /// Never checked; nothing is shown while the user types.
    #[default]
    Untouched,
    /// Checked once, on first loss of focus.
    Touched,
    /// Checked again on every change.
    Revalidating,
}

/// Per-field view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub error: Option<&'static str>,
    pub touched: bool,
    pub invalid: bool,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The sanitized record that crossed the boundary.
    Submitted(JobApplicationRecord),
    /// Validation refused the record; nothing left the session.
    Invalid(Vec<Issue>),
}

/// One editing session over one record. Owns the record, the per-field
/// check state, the draft store, and the submission controller, and keeps
/// them consistent as edits arrive.
pub struct FormSession {
    record: JobApplicationRecord,
    phases: HashMap<FieldId, CheckPhase>,
    errors: HashMap<FieldId, &'static str>,
    edited: HashSet<FieldId>,
    touched: bool,
    store: DraftStore,
    controller: SubmissionController,
}

impl FormSession {
    /// Open a session, restoring any saved draft wholesale. A restored
    /// draft is not validated here; its fields go through the normal
    /// check gates like any other input.
    pub fn start(store: DraftStore, controller: SubmissionController) -> Self {
        let record = store.load().unwrap_or_default();
        Self {
            record,
            phases: HashMap::new(),
            errors: HashMap::new(),
            edited: HashSet::new(),
            touched: false,
            store,
            controller,
        }
    }

    /// Apply one field edit. Fields past their first blur are re-checked
    /// immediately; untouched fields stay quiet until they blur.
    pub fn on_edit(&mut self, field: FieldId, value: &str) {
        self.record.set(field, value);
        self.edited.insert(field);
        self.touched = true;
        if self.phase(field) != CheckPhase::Untouched {
            self.phases.insert(field, CheckPhase::Revalidating);
            self.check(field);
        }
        self.changed();
    }

    /// Focus left the field. Only the first blur runs a check; after that,
    /// changes drive revalidation and further blurs do nothing.
    pub fn on_blur(&mut self, field: FieldId) {
        if self.phase(field) == CheckPhase::Untouched {
            self.phases.insert(field, CheckPhase::Touched);
            self.check(field);
        }
    }

    /// Validate and, if clean, sanitize and submit. An invalid record
    /// surfaces every issue and flips all fields to continuous checking.
    /// A boundary failure leaves the record and draft untouched and is
    /// rethrown after being retained for display.
    pub fn on_submit(&mut self) -> Result<SubmitOutcome> {
        if let Err(issues) = validate(&self.record) {
            self.errors = issues.iter().map(|issue| (issue.field, issue.message)).collect();
            for field in FieldId::ALL {
                self.phases.insert(field, CheckPhase::Revalidating);
            }
            return Ok(SubmitOutcome::Invalid(issues));
        }

        self.errors.clear();
        let clean = self.controller.submit(&self.record)?;
        self.store.clear();
        self.reset();
        Ok(SubmitOutcome::Submitted(clean))
    }

    pub fn field_state(&self, field: FieldId) -> FieldState {
        let error = self.errors.get(&field).copied();
        FieldState {
            value: self.record.get(field),
            error,
            touched: self.edited.contains(&field),
            invalid: error.is_some(),
        }
    }

    pub fn phase(&self, field: FieldId) -> CheckPhase {
        self.phases.get(&field).copied().unwrap_or_default()
    }

    pub fn record(&self) -> &JobApplicationRecord {
        &self.record
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    pub fn is_submitting(&self) -> bool {
        self.controller.is_submitting()
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.controller.last_error()
    }

    pub fn clear_submission_error(&mut self) {
        self.controller.clear_error()
    }

    pub fn boundary_name(&self) -> String {
        self.controller.boundary_name()
    }

    fn check(&mut self, field: FieldId) {
        match check_field(&self.record, field) {
            Some(issue) => {
                self.errors.insert(field, issue.message);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    /// Autosave hook, called after every applied edit. Nothing is written
    /// until the user has actually changed something, so opening and
    /// closing the form never creates an empty draft.
    fn changed(&mut self) {
        if self.touched {
            self.store.save(&self.record);
        }
    }

    fn reset(&mut self) {
        self.record = JobApplicationRecord::default();
        self.phases.clear();
        self.errors.clear();
        self.edited.clear();
        self.touched = false;
    }
}
