use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use thiserror::Error;

use form_spec::{
    AnswerSet, FieldSpec, report_catalogue_warnings, validate_field, visible_fields,
};

/// Caller misuse: a programming bug in the host UI, not user input. Field
/// level validation failures are never surfaced this way; they land in
/// [`Session::errors`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("field '{0}' is not in the current visible set")]
    FieldNotVisible(String),
    #[error("unknown field id '{0}'")]
    UnknownField(String),
    #[error("'{0}' is only available while the session is in progress")]
    NotInProgress(&'static str),
    #[error("force_advance requires an optional session")]
    NotOptionalSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    AllComplete,
}

/// Result of a `submit` call. A rejected submission leaves the cursor in
/// place and records the message in the session's error map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// When set, required-field violations are advisory only and
    /// `force_advance` lets the user past any validation failure.
    pub optional_session: bool,
}

/// One in-progress form: the answer map, completion tracking, and the
/// cursor into the visible field sequence. Exclusively owned by the form
/// instance that created it; every operation is synchronous.
#[derive(Debug, Clone)]
pub struct Session {
    fields: Vec<FieldSpec>,
    answers: Map<String, Value>,
    completed: BTreeSet<String>,
    errors: BTreeMap<String, String>,
    cursor: usize,
    state: SessionState,
    optional_session: bool,
}

impl Session {
    /// Builds a session from a catalogue and previously persisted answers.
    ///
    /// Every initial answer is copied in, failing values included, so the
    /// host can show them. An answer marks its field completed when it
    /// validates or the field is non-required; otherwise the error is
    /// recorded and the field stays incomplete so the user is prompted to
    /// fix it. The cursor lands on the first visible incomplete field.
    ///
    /// Deterministic: identical inputs produce identical sessions.
    pub fn new(
        fields: Vec<FieldSpec>,
        initial_answers: Map<String, Value>,
        options: SessionOptions,
    ) -> Self {
        report_catalogue_warnings(&fields);

        let mut completed = BTreeSet::new();
        let mut errors = BTreeMap::new();
        for field in &fields {
            if let Some(value) = initial_answers.get(&field.id) {
                match validate_field(field, value, options.optional_session) {
                    None => {
                        completed.insert(field.id.clone());
                    }
                    Some(_) if !field.required => {
                        completed.insert(field.id.clone());
                    }
                    Some(message) => {
                        errors.insert(field.id.clone(), message);
                    }
                }
            }
        }

        let mut session = Self {
            fields,
            answers: initial_answers,
            completed,
            errors,
            cursor: 0,
            state: SessionState::InProgress,
            optional_session: options.optional_session,
        };
        session.settle_initial();
        session
    }

    fn settle_initial(&mut self) {
        let visible = visible_fields(&self.fields, &self.answers);
        match visible
            .iter()
            .position(|field| !self.completed.contains(&field.id))
        {
            Some(position) => {
                self.cursor = position;
                self.state = SessionState::InProgress;
            }
            None => {
                self.cursor = visible.len();
                self.state = SessionState::AllComplete;
            }
        }
    }

    /// The catalogue projected onto its currently visible subset, in
    /// catalogue order. Recomputed from the answers on every call.
    pub fn visible_fields(&self) -> Vec<&FieldSpec> {
        visible_fields(&self.fields, &self.answers)
    }

    /// The field under the cursor, or `None` once the session is complete.
    pub fn current_field(&self) -> Option<&FieldSpec> {
        self.visible_fields().get(self.cursor).copied()
    }

    /// Validates and records an answer for a currently visible field.
    ///
    /// On acceptance the cursor advances to the first incomplete visible
    /// field after the submitted one, wrapping to the earliest incomplete
    /// field, and the session completes when none remain. A rejected value
    /// leaves the cursor and the answer map untouched.
    pub fn submit(&mut self, field_id: &str, value: Value) -> Result<SubmitOutcome, SessionError> {
        let field = self.visible_field(field_id)?;

        if let Some(message) = validate_field(field, &value, self.optional_session) {
            self.errors.insert(field_id.to_string(), message);
            return Ok(SubmitOutcome::Rejected);
        }

        self.answers.insert(field_id.to_string(), value);
        self.completed.insert(field_id.to_string());
        self.errors.remove(field_id);
        self.advance_from(field_id);
        Ok(SubmitOutcome::Accepted)
    }

    /// Moves the cursor back one visible field, clamped at the first.
    /// Moving backward never un-completes a field.
    pub fn previous(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::InProgress {
            return Err(SessionError::NotInProgress("previous"));
        }
        self.cursor = self.cursor.saturating_sub(1);
        Ok(())
    }

    /// Jumps the cursor to any visible field, e.g. from a review summary,
    /// returning the machine to `InProgress` without touching the
    /// completed set.
    pub fn jump_to(&mut self, field_id: &str) -> Result<(), SessionError> {
        if !self.fields.iter().any(|field| field.id == field_id) {
            return Err(SessionError::UnknownField(field_id.to_string()));
        }
        let visible = visible_fields(&self.fields, &self.answers);
        let position = visible
            .iter()
            .position(|field| field.id == field_id)
            .ok_or_else(|| SessionError::FieldNotVisible(field_id.to_string()))?;
        self.cursor = position;
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// Optional-session escape hatch: writes the value verbatim regardless
    /// of the validation outcome and advances strictly one position, so an
    /// optional section can never trap the user behind a validation error.
    /// Reaching the end completes the session even with empty required
    /// fields.
    pub fn force_advance(&mut self, field_id: &str, value: Value) -> Result<(), SessionError> {
        if !self.optional_session {
            return Err(SessionError::NotOptionalSession);
        }
        let field = self.visible_field(field_id)?;

        match validate_field(field, &value, true) {
            None => {
                self.completed.insert(field_id.to_string());
                self.errors.remove(field_id);
            }
            Some(message) => {
                self.errors.insert(field_id.to_string(), message);
            }
        }
        self.answers.insert(field_id.to_string(), value);

        let visible = visible_fields(&self.fields, &self.answers);
        let position = visible
            .iter()
            .position(|field| field.id == field_id)
            .unwrap_or_else(|| self.cursor.min(visible.len()));
        if position + 1 >= visible.len() {
            self.cursor = visible.len();
            self.state = SessionState::AllComplete;
            tracing::debug!(field_id, "optional section exhausted, session complete");
        } else {
            self.cursor = position + 1;
            self.state = SessionState::InProgress;
        }
        Ok(())
    }

    /// `completed ∩ visible` over `visible`; an empty visible set counts as
    /// fully complete since there is nothing left to answer.
    pub fn completion_fraction(&self) -> f64 {
        let visible = visible_fields(&self.fields, &self.answers);
        if visible.is_empty() {
            return 1.0;
        }
        let done = visible
            .iter()
            .filter(|field| self.completed.contains(&field.id))
            .count();
        done as f64 / visible.len() as f64
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::AllComplete
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Cursor index into the visible field sequence.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_optional_session(&self) -> bool {
        self.optional_session
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Latest validation message per field, cleared on successful edit.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Current answers, stale entries for hidden fields included so that
    /// re-showing a field restores prior input.
    pub fn answers(&self) -> &Map<String, Value> {
        &self.answers
    }

    pub fn is_field_completed(&self, field_id: &str) -> bool {
        self.completed.contains(field_id)
    }

    /// Owned snapshot of the answers for the host's persistence layer.
    pub fn snapshot(&self) -> AnswerSet {
        AnswerSet::new(self.answers.clone())
    }

    fn visible_field(&self, field_id: &str) -> Result<&FieldSpec, SessionError> {
        let index = self
            .fields
            .iter()
            .position(|field| field.id == field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))?;
        let visible = visible_fields(&self.fields, &self.answers);
        if !visible.iter().any(|field| field.id == field_id) {
            return Err(SessionError::FieldNotVisible(field_id.to_string()));
        }
        Ok(&self.fields[index])
    }

    /// Re-resolves visibility after an accepted answer and repositions the
    /// cursor: first incomplete visible field strictly after the submitted
    /// one, wrapping to the earliest incomplete field. When the submitted
    /// answer hid the submitted field itself, the scan starts from the old
    /// cursor position.
    fn advance_from(&mut self, submitted_id: &str) {
        let visible = visible_fields(&self.fields, &self.answers);

        if visible
            .iter()
            .all(|field| self.completed.contains(&field.id))
        {
            self.cursor = visible.len();
            self.state = SessionState::AllComplete;
            tracing::debug!(submitted_id, "all visible fields completed");
            return;
        }

        let from = visible
            .iter()
            .position(|field| field.id == submitted_id)
            .unwrap_or_else(|| self.cursor.min(visible.len()));
        let next = visible
            .iter()
            .enumerate()
            .skip(from + 1)
            .find(|(_, field)| !self.completed.contains(&field.id))
            .map(|(index, _)| index)
            .or_else(|| {
                visible
                    .iter()
                    .position(|field| !self.completed.contains(&field.id))
            });
        if let Some(position) = next {
            self.cursor = position;
            self.state = SessionState::InProgress;
        }
    }
}
