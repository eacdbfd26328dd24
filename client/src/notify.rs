//! User-visible alerts.
//!
//! Library code never prints. Flows that would show an alert or a success
//! banner hand the text to a [`Notifier`]; the CLI prints it and tests record
//! it in memory.

#[cfg(test)]
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.notify(Level::Info, message);
    }

    fn error(&self, message: &str) {
        self.notify(Level::Error, message);
    }
}

/// Keeps every alert in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl RecordingNotifier {
    #[must_use]
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.messages().into_iter().filter(|(level, _)| *level == Level::Error).map(|(_, m)| m).collect()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).push((level, message.to_owned()));
    }
}
