use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::clipboard::ClipboardWriter;
use crate::error::SpecError;
use crate::orchestrator::{ProductDescription, RequestOrchestrator, SpecificationResult};

/// How long a field shows its "copied" confirmation.
pub const COPY_FEEDBACK: Duration = Duration::from_secs(2);

/// Lifecycle of the current generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Nothing in flight. `error` is set when the last generate was rejected as empty.
    Idle { error: Option<String> },
    Loading,
    Succeeded(SpecificationResult),
    Failed(String),
}

impl Default for RequestState {
    fn default() -> Self {
        RequestState::Idle { error: None }
    }
}

/// A displayed result field that can be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecField {
    English,
    Arabic,
}

impl SpecField {
    pub fn text(self, result: &SpecificationResult) -> &str {
        match self {
            SpecField::English => &result.english_specs,
            SpecField::Arabic => &result.arabic_specs,
        }
    }
}

/// "Recently copied" flag that expires on its own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyFlag {
    copied_until: Option<Instant>,
}

impl CopyFlag {
    /// Set the flag; a repeat mark restarts the window.
    pub fn mark(&mut self, now: Instant) {
        self.copied_until = Some(now + COPY_FEEDBACK);
    }

    pub fn is_set(&self, now: Instant) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    pub fn reset(&mut self) {
        self.copied_until = None;
    }
}

/// Owns the interaction state and drives the orchestrator and clipboard.
pub struct UIController {
    description: String,
    state: RequestState,
    english_copied: CopyFlag,
    arabic_copied: CopyFlag,
    clipboard: Box<dyn ClipboardWriter>,
}

impl UIController {
    pub fn new(clipboard: Box<dyn ClipboardWriter>) -> Self {
        Self {
            description: String::new(),
            state: RequestState::default(),
            english_copied: CopyFlag::default(),
            arabic_copied: CopyFlag::default(),
            clipboard,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading)
    }

    pub fn result(&self) -> Option<&SpecificationResult> {
        match &self.state {
            RequestState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            RequestState::Idle { error } => error.as_deref(),
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Replace the description. Ignored while loading.
    pub fn set_description(&mut self, text: impl Into<String>) -> bool {
        self.edit_description(|d| *d = text.into())
    }

    /// Apply an edit to the description. Returns false (and does nothing) while loading.
    pub fn edit_description(&mut self, edit: impl FnOnce(&mut String)) -> bool {
        if self.is_loading() {
            return false;
        }
        edit(&mut self.description);
        true
    }

    /// Enter `Loading` and hand back the description to submit.
    ///
    /// Returns `None` when a request is already in flight or the description is
    /// blank; in the second case the state becomes `Idle` with the validation message.
    pub fn begin_generation(&mut self) -> Option<ProductDescription> {
        if self.is_loading() {
            debug!("Generate ignored: a request is already in flight");
            return None;
        }
        self.reset_copy_flags();
        match ProductDescription::new(self.description.clone()) {
            Ok(description) => {
                self.state = RequestState::Loading;
                Some(description)
            }
            Err(e) => {
                self.state = RequestState::Idle {
                    error: Some(e.to_string()),
                };
                None
            }
        }
    }

    /// Record the outcome of the request started by `begin_generation`.
    pub fn complete_generation(&mut self, outcome: Result<SpecificationResult, SpecError>) {
        if !self.is_loading() {
            debug!("Discarding generation outcome: controller is not loading");
            return;
        }
        self.state = match outcome {
            Ok(result) => {
                info!("Specifications generated");
                RequestState::Succeeded(result)
            }
            Err(e) => RequestState::Failed(e.to_string()),
        };
    }

    /// Begin, run and complete one generation in place.
    pub async fn generate(&mut self, orchestrator: &RequestOrchestrator) {
        if let Some(description) = self.begin_generation() {
            let outcome = orchestrator.generate(&description).await;
            self.complete_generation(outcome);
        }
    }

    /// Back to a blank `Idle`.
    pub fn clear(&mut self) {
        self.description.clear();
        self.state = RequestState::default();
        self.reset_copy_flags();
    }

    pub fn copy(&mut self, field: SpecField) -> bool {
        self.copy_at(field, Instant::now())
    }

    /// Write a result field to the clipboard. Failures are logged and otherwise ignored.
    pub fn copy_at(&mut self, field: SpecField, now: Instant) -> bool {
        let Some(text) = self.result().map(|r| field.text(r).to_owned()) else {
            return false;
        };
        match self.clipboard.write_text(&text) {
            Ok(()) => {
                self.flag_mut(field).mark(now);
                true
            }
            Err(e) => {
                warn!("Copy of {:?} specifications failed: {:#}", field, e);
                false
            }
        }
    }

    pub fn is_copied(&self, field: SpecField) -> bool {
        self.is_copied_at(field, Instant::now())
    }

    pub fn is_copied_at(&self, field: SpecField, now: Instant) -> bool {
        match field {
            SpecField::English => self.english_copied.is_set(now),
            SpecField::Arabic => self.arabic_copied.is_set(now),
        }
    }

    fn flag_mut(&mut self, field: SpecField) -> &mut CopyFlag {
        match field {
            SpecField::English => &mut self.english_copied,
            SpecField::Arabic => &mut self.arabic_copied,
        }
    }

    fn reset_copy_flags(&mut self) {
        self.english_copied.reset();
        self.arabic_copied.reset();
    }
}
