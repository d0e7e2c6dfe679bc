//! Caller-supplied cancellation and deadlines.
//!
//! Every store round-trip and every retry backoff is raced against a
//! [`CancelSignal`]. A fired signal surfaces as [`CurriculumError::Cancelled`].

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::CurriculumError;

/// Trigger side of a [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (
            Self { tx },
            CancelSignal {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: Some(self.tx.subscribe()),
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once the flag is raised or the deadline passes.
    pub async fn cancelled(&self) {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let flag = async {
            match self.rx.clone() {
                Some(mut rx) => {
                    // A dropped handle can never cancel.
                    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                    if closed {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = deadline => {},
            _ = flag => {},
        }
    }

    /// Runs `fut` unless the signal fires first.
    pub async fn guard<F, T, E>(&self, fut: F) -> Result<T, CurriculumError>
    where
        F: Future<Output = Result<T, E>>,
        CurriculumError: From<E>,
    {
        if self.is_cancelled() {
            return Err(CurriculumError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(CurriculumError::Cancelled),
            result = fut => result.map_err(CurriculumError::from),
        }
    }

    pub async fn sleep(&self, duration: Duration) -> Result<(), CurriculumError> {
        if duration.is_zero() {
            return if self.is_cancelled() {
                Err(CurriculumError::Cancelled)
            } else {
                Ok(())
            };
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(CurriculumError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
