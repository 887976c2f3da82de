//! What a running session remembers between user actions.

use std::sync::Arc;

use crate::capacity::{ErrorCorrectionLevel, Payload};
use crate::error::{Error, Result};
use crate::icon::Icon;

/// The inputs of the last successful generation.
///
/// Exports re-derive everything from this snapshot, so several exports at different sizes never
/// share a symbol or a canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSession {
    pub text: String,
    pub level: ErrorCorrectionLevel,
}

impl GeneratedSession {
    /// A fresh payload built from the stored text.
    pub fn payload(&self) -> Payload {
        Payload::from_text(&self.text)
    }
}

/// Last generation plus the current icon. Lives as long as the process, nothing is persisted.
#[derive(Debug, Default)]
pub struct SessionState {
    generated: Option<GeneratedSession>,
    icon: Option<Arc<Icon>>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    /// Replaces the stored generation. Call only after generation succeeded.
    pub fn record(&mut self, text: String, level: ErrorCorrectionLevel) {
        self.generated = Some(GeneratedSession { text, level });
    }

    pub fn current_payload(&self) -> Option<&GeneratedSession> {
        self.generated.as_ref()
    }

    /// Like [`current_payload`](Self::current_payload), failing with
    /// [`Error::NoActiveSession`] before the first generation.
    pub fn require_payload(&self) -> Result<&GeneratedSession> {
        self.current_payload().ok_or(Error::NoActiveSession)
    }

    /// Replaces the icon wholesale; `None` clears it.
    pub fn set_icon(&mut self, icon: Option<Arc<Icon>>) {
        self.icon = icon;
    }

    /// A handle to the current icon. The icon itself is never mutated, so a handle taken before
    /// a re-upload keeps seeing the old version.
    pub fn icon(&self) -> Option<Arc<Icon>> {
        self.icon.clone()
    }
}
