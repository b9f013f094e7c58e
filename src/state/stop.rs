use tokio_util::sync::CancellationToken;

/// Monotone stop signal shared by the supervisor and every TA.
///
/// Backed by a `CancellationToken`, so once raised it can never be lowered.
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    token: CancellationToken,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns true if this call was the one that raised it.
    pub fn raise(&self) -> bool {
        let was_raised = self.token.is_cancelled();
        self.token.cancel();
        !was_raised
    }

    /// Lock-free read. A stale `false` is tolerated: the flag only moves one
    /// way and every TA re-reads it once per loop.
    pub fn is_raised(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the flag is raised.
    pub async fn raised(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_lowered() {
        assert!(!StopFlag::new().is_raised());
    }

    #[test]
    fn raise_is_monotone_and_shared() {
        let flag = StopFlag::new();
        let observer = flag.clone();
        assert!(flag.raise());
        assert!(!flag.raise());
        assert!(flag.is_raised());
        assert!(observer.is_raised());
    }

    #[tokio::test]
    async fn raised_resolves_after_raise() {
        let flag = StopFlag::new();
        let waiter = flag.clone();
        let handle = tokio::spawn(async move { waiter.raised().await });
        flag.raise();
        handle.await.unwrap();
    }
}
