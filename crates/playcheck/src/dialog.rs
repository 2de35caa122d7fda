//! Dialog handling for `alert`, `confirm`, `prompt` and `beforeunload`.
//!
//! JavaScript dialogs block the page until answered, so the answer must be
//! decided while the triggering action is still in flight. A
//! [`DialogHandler`] is installed on each page ahead of time; the driver
//! consults it for every dialog and records what it did.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogType {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
    /// Before unload dialog (Leave/Stay buttons)
    BeforeUnload,
}

impl fmt::Display for DialogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
            Self::BeforeUnload => write!(f, "beforeunload"),
        }
    }
}

/// Answer given to a dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    /// OK / Leave
    Accept,
    /// OK with prompt text
    AcceptWith(String),
    /// Cancel / Stay
    Dismiss,
}

impl DialogAction {
    /// Whether the dialog is confirmed
    #[must_use]
    pub const fn accepts(&self) -> bool {
        !matches!(self, Self::Dismiss)
    }

    /// Prompt text sent with the answer
    #[must_use]
    pub fn prompt_text(&self) -> Option<&str> {
        match self {
            Self::AcceptWith(text) => Some(text),
            _ => None,
        }
    }
}

/// A dialog raised by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    dialog_type: DialogType,
    message: String,
    default_value: Option<String>,
    action: Option<DialogAction>,
}

impl Dialog {
    /// Create a new dialog
    #[must_use]
    pub fn new(dialog_type: DialogType, message: impl Into<String>) -> Self {
        Self {
            dialog_type,
            message: message.into(),
            default_value: None,
            action: None,
        }
    }

    /// Create an alert dialog
    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogType::Alert, message)
    }

    /// Create a confirm dialog
    #[must_use]
    pub fn confirm(message: impl Into<String>) -> Self {
        Self::new(DialogType::Confirm, message)
    }

    /// Create a prompt dialog
    #[must_use]
    pub fn prompt(message: impl Into<String>, default: Option<String>) -> Self {
        let mut dialog = Self::new(DialogType::Prompt, message);
        dialog.default_value = default;
        dialog
    }

    /// Get dialog type
    #[must_use]
    pub const fn dialog_type(&self) -> DialogType {
        self.dialog_type
    }

    /// Get dialog message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Default value (for prompts)
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    /// Answer given, once handled
    #[must_use]
    pub const fn action(&self) -> Option<&DialogAction> {
        self.action.as_ref()
    }

    /// Check if dialog was handled
    #[must_use]
    pub const fn is_handled(&self) -> bool {
        self.action.is_some()
    }

    /// Accept the dialog
    pub fn accept(&mut self) {
        self.action = Some(DialogAction::Accept);
    }

    /// Accept the dialog with input text (for prompts)
    pub fn accept_with(&mut self, text: impl Into<String>) {
        self.action = Some(DialogAction::AcceptWith(text.into()));
    }

    /// Dismiss the dialog
    pub fn dismiss(&mut self) {
        self.action = Some(DialogAction::Dismiss);
    }
}

/// Handler function type for dialogs
pub type DialogHandlerFn = Box<dyn Fn(&mut Dialog) + Send + Sync>;

/// What happens to dialogs no callback answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoDialogBehavior {
    /// Dismiss, but let `beforeunload` through
    #[default]
    Dismiss,
    /// Accept every dialog
    AcceptAll,
    /// Accept prompts with their default value
    UseDefault,
}

/// Per-page dialog policy plus a record of every dialog seen
#[derive(Clone)]
pub struct DialogHandler {
    dialogs: Arc<Mutex<Vec<Dialog>>>,
    handler: Arc<Mutex<Option<DialogHandlerFn>>>,
    auto_behavior: Arc<Mutex<AutoDialogBehavior>>,
}

impl DialogHandler {
    /// Create a new dialog handler
    #[must_use]
    pub fn new() -> Self {
        Self {
            dialogs: Arc::new(Mutex::new(Vec::new())),
            handler: Arc::new(Mutex::new(None)),
            auto_behavior: Arc::new(Mutex::new(AutoDialogBehavior::default())),
        }
    }

    /// Set the callback consulted for each dialog
    pub fn on_dialog<F>(&self, handler: F)
    where
        F: Fn(&mut Dialog) + Send + Sync + 'static,
    {
        if let Ok(mut h) = self.handler.lock() {
            *h = Some(Box::new(handler));
        }
    }

    /// Remove the callback
    pub fn clear_handler(&self) {
        if let Ok(mut h) = self.handler.lock() {
            *h = None;
        }
    }

    /// Set automatic behavior
    pub fn set_auto_behavior(&self, behavior: AutoDialogBehavior) {
        if let Ok(mut b) = self.auto_behavior.lock() {
            *b = behavior;
        }
    }

    /// Decide the answer for an incoming dialog and record it
    pub fn handle(&self, mut dialog: Dialog) -> DialogAction {
        if let Ok(handler) = self.handler.lock() {
            if let Some(h) = handler.as_ref() {
                h(&mut dialog);
            }
        }

        if !dialog.is_handled() {
            let behavior = self.auto_behavior.lock().map(|b| *b).unwrap_or_default();
            match (behavior, dialog.dialog_type) {
                (_, DialogType::BeforeUnload) | (AutoDialogBehavior::AcceptAll, _) => {
                    dialog.accept();
                }
                (AutoDialogBehavior::UseDefault, DialogType::Prompt) => {
                    let text = dialog.default_value.clone().unwrap_or_default();
                    dialog.accept_with(text);
                }
                (AutoDialogBehavior::UseDefault, _) => dialog.accept(),
                (AutoDialogBehavior::Dismiss, _) => dialog.dismiss(),
            }
        }

        let action = dialog.action.clone().unwrap_or(DialogAction::Dismiss);
        debug!(
            dialog_type = %dialog.dialog_type,
            message = %dialog.message,
            accepted = action.accepts(),
            "dialog handled"
        );
        if let Ok(mut dialogs) = self.dialogs.lock() {
            dialogs.push(dialog);
        }
        action
    }

    /// Get all dialogs encountered
    #[must_use]
    pub fn dialogs(&self) -> Vec<Dialog> {
        self.dialogs.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Get count of dialogs
    #[must_use]
    pub fn dialog_count(&self) -> usize {
        self.dialogs.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Clear dialog history
    pub fn clear(&self) {
        if let Ok(mut d) = self.dialogs.lock() {
            d.clear();
        }
    }

    /// Get last dialog
    #[must_use]
    pub fn last_dialog(&self) -> Option<Dialog> {
        self.dialogs.lock().ok().and_then(|d| d.last().cloned())
    }
}

impl Default for DialogHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DialogHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auto_behavior = self.auto_behavior.lock().map(|b| *b).unwrap_or_default();
        f.debug_struct("DialogHandler")
            .field("dialog_count", &self.dialog_count())
            .field("auto_behavior", &auto_behavior)
            .finish_non_exhaustive()
    }
}
