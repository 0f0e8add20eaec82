//! User-visible error reporting for the synchronizer.

use parking_lot::Mutex;

pub trait ErrorReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Logs each report and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, message: &str) {
        tracing::error!(message, "reported to user");
    }
}

/// Keeps every reported message so a UI can show the latest one and dismiss it.
#[derive(Debug, Default)]
pub struct ErrorLog {
    messages: Mutex<Vec<String>>,
}

impl ErrorLog {
    pub fn new() -> Self { Self::default() }

    pub fn latest(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn all(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl ErrorReporter for ErrorLog {
    fn report(&self, message: &str) {
        tracing::error!(message, "reported to user");
        self.messages.lock().push(message.to_string());
    }
}
