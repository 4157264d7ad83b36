//! Build Context: estado compartilhado durante um build
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::FlixError;

#[derive(Debug, Clone)]
pub struct BuildContext {
    pub trace_id: String,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Build aborts once `timeout` has elapsed from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Shares an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fails fast when the build has been cancelled or has run past its deadline.
    pub fn check(&self) -> Result<(), FlixError> {
        if self.is_cancelled() {
            return Err(FlixError::Cancelled);
        }
        Ok(())
    }

    /// Runs `fut` unless cancellation or the deadline fires first.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T, FlixError>
    where
        F: Future<Output = Result<T, FlixError>>,
    {
        self.check()?;
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => Err(FlixError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => Err(FlixError::Cancelled),
                res = fut => res,
            },
            None => tokio::select! {
                _ = self.cancel.cancelled() => Err(FlixError::Cancelled),
                res = fut => res,
            },
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}
