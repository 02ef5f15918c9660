//! UI chrome state: transient toast notifications.

#[cfg(test)]
#[path = "ui_test.rs"]
mod ui_test;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub message: String,
}

/// Toasts currently on screen, oldest first.
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub toasts: Vec<Toast>,
    next_toast_id: u64,
}

impl UiState {
    /// Queue a toast and return its id for later dismissal.
    pub fn push_toast(&mut self, level: ToastLevel, message: impl Into<String>) -> u64 {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        self.toasts.push(Toast { id, level, message: message.into() });
        id
    }

    pub fn dismiss_toast(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }
}
