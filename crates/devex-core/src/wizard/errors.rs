//! Bounded, thread-safe collection of user-visible error messages.

use std::sync::Mutex;

/// Collects error messages up to a fixed capacity. Once full, the final
/// slot is replaced by a truncation sentinel carrying the latest message,
/// so the list never grows past the bound but the newest failure is still
/// visible.
#[derive(Debug)]
pub struct ErrorCollector {
    inner: Mutex<Vec<String>>,
    capacity: usize,
}

impl ErrorCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a message, honoring the bound.
    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        let Ok(mut guard) = self.inner.lock() else {
            return;
        };
        if guard.len() < self.capacity {
            guard.push(message);
        } else {
            let last = guard.len() - 1;
            guard[last] = format!("truncated at {} (last: {})", self.capacity, message);
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.clear();
        }
    }
}
