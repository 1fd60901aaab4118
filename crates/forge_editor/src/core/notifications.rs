//! Transient user-facing messages.
//!
//! The host UI drains these each frame and shows them as toasts. Every
//! message is mirrored to the `log` facade as it is posted.

use std::collections::VecDeque;
use std::time::Instant;

/// Severity of a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "[INFO]",
            NoticeLevel::Warning => "[WARN]",
            NoticeLevel::Error => "[ERROR]",
        }
    }
}

/// A single notification.
#[derive(Clone, Debug)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timestamp: Instant,
    /// Number of identical messages collapsed into this one
    pub count: u32,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Instant::now(),
            count: 1,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.level.prefix(), self.message)?;
        if self.count > 1 {
            write!(f, " (x{})", self.count)?;
        }
        Ok(())
    }
}

/// Bounded queue of pending notifications.
#[derive(Debug)]
pub struct Notifications {
    entries: VecDeque<Notice>,
    max_entries: usize,
    pub collapse_duplicates: bool,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: 100,
            collapse_duplicates: true,
        }
    }
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            ..Default::default()
        }
    }

    /// Post a message with the given level.
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();

        match level {
            NoticeLevel::Info => log::info!("{}", message),
            NoticeLevel::Warning => log::warn!("{}", message),
            NoticeLevel::Error => log::error!("{}", message),
        }

        if self.collapse_duplicates {
            if let Some(last) = self.entries.back_mut() {
                if last.level == level && last.message == message {
                    last.count += 1;
                    last.timestamp = Instant::now();
                    return;
                }
            }
        }

        self.entries.push_back(Notice::new(level, message));

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    pub fn entries(&self) -> impl Iterator<Item = &Notice> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.entries.back()
    }

    /// Take every pending notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let mut notices = Notifications::new();
        notices.warn("Cannot snap an object onto itself");
        notices.warn("Cannot snap an object onto itself");
        notices.info("Aligned 2 objects");

        let drained = notices.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].count, 2);
        assert!(drained[0].to_string().ends_with("(x2)"));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_bounded() {
        let mut notices = Notifications::with_capacity(3);
        for i in 0..5 {
            notices.info(format!("message {i}"));
        }
        assert_eq!(notices.len(), 3);
        assert_eq!(notices.entries().next().unwrap().message, "message 2");
    }
}
