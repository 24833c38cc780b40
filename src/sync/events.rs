//! User-visible notices raised by the synchronizers.
//!
//! Every outcome the user should hear about (a failed fetch, a submitted or confirmed donation, a
//! failed submission) becomes a toast-style [`Notice`]. Notices are dispatched to every registered
//! [`NoticeHandler`]; a failing handler is logged and never stops the others, and never affects
//! the view that raised the notice.

use crate::sync::SyncError;

use std::sync::{Arc, Mutex};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Optional reference shown alongside the message (e.g. a transaction hash).
    pub reference: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            reference: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            reference: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Trait for receiving notices.
#[async_trait::async_trait]
pub trait NoticeHandler: Send + Sync {
    /// Handle a notice.
    async fn handle(&self, notice: &Notice) -> Result<(), SyncError>;

    /// Get the name of this handler for logging and diagnostics.
    fn name(&self) -> &'static str;
}

/// Dispatcher that fans notices out to all registered handlers.
///
/// Cloning shares the registered handlers.
#[derive(Clone, Default)]
pub struct NoticeDispatcher {
    handlers: Vec<Arc<dyn NoticeHandler>>,
}

impl NoticeDispatcher {
    /// Create a new, empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new handler. Handlers are called in the order they are registered.
    pub fn register_handler(&mut self, handler: Arc<dyn NoticeHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatch a notice to all registered handlers.
    pub async fn dispatch(&self, notice: Notice) {
        for handler in &self.handlers {
            if let Err(e) = handler.handle(&notice).await {
                tracing::error!("Handler {} failed to process notice: {}", handler.name(), e);
            }
        }
    }
}

/// Writes notices to the log.
pub struct LogNoticeHandler;

#[async_trait::async_trait]
impl NoticeHandler for LogNoticeHandler {
    async fn handle(&self, notice: &Notice) -> Result<(), SyncError> {
        let reference = notice.reference.as_deref().unwrap_or("");
        match notice.level {
            NoticeLevel::Success => tracing::info!("{} {}", notice.message, reference),
            NoticeLevel::Warning => tracing::warn!("{} {}", notice.message, reference),
            NoticeLevel::Error => tracing::error!("{} {}", notice.message, reference),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogNoticeHandler"
    }
}

/// Keeps notices in memory until the presentation layer drains them.
#[derive(Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every notice received so far.
    pub fn drain(&self) -> Vec<Notice> {
        let mut notices = self.notices.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *notices)
    }
}

#[async_trait::async_trait]
impl NoticeHandler for NoticeLog {
    async fn handle(&self, notice: &Notice) -> Result<(), SyncError> {
        let mut notices = self.notices.lock().unwrap_or_else(|p| p.into_inner());
        notices.push(notice.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NoticeLog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingHandler;

    #[async_trait::async_trait]
    impl NoticeHandler for FailingHandler {
        async fn handle(&self, _notice: &Notice) -> Result<(), SyncError> {
            Err(SyncError::QueryFailure("handler down".to_string()))
        }

        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let log = Arc::new(NoticeLog::new());
        let mut dispatcher = NoticeDispatcher::new();
        dispatcher.register_handler(Arc::new(FailingHandler));
        dispatcher.register_handler(log.clone());

        dispatcher
            .dispatch(Notice::success("Transaction submitted").with_reference("0xabc"))
            .await;

        let notices = log.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].reference.as_deref(), Some("0xabc"));
        assert!(log.drain().is_empty());
    }
}
