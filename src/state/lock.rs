use tokio::sync::{Mutex, MutexGuard};

/// The four locks of the marking protocol.
///
/// Ordering rules:
/// - `Rubric` and `Exam` are never nested with each other
/// - `Loader` may take `Exam` inside it, never the reverse
/// - `Print` is always a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockName {
    Rubric,
    Exam,
    Loader,
    Print,
}

impl std::fmt::Display for LockName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockName::Rubric => write!(f, "rubric"),
            LockName::Exam => write!(f, "exam"),
            LockName::Loader => write!(f, "loader"),
            LockName::Print => write!(f, "print"),
        }
    }
}

/// A non-reentrant mutex tagged with the region it guards.
#[derive(Debug)]
pub struct NamedLock<T> {
    name: LockName,
    inner: Mutex<T>,
}

impl<T> NamedLock<T> {
    pub fn new(name: LockName, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(value),
        }
    }

    pub fn name(&self) -> LockName {
        self.name
    }

    pub async fn acquire(&self) -> MutexGuard<'_, T> {
        tracing::trace!(lock = %self.name, "Acquiring lock");
        self.inner.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn guard_releases_on_drop() {
        let lock = NamedLock::new(LockName::Exam, 0u32);
        {
            let mut guard = lock.acquire().await;
            *guard += 1;
            assert!(lock.inner.try_lock().is_err());
        }
        assert_eq!(*lock.acquire().await, 1);
        assert_eq!(lock.name(), LockName::Exam);
    }

    #[test]
    fn lock_names_display() {
        let names: Vec<String> = [LockName::Rubric, LockName::Exam, LockName::Loader, LockName::Print]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["rubric", "exam", "loader", "print"]);
    }
}
