//! Breadcrumb trail
//!
//! Bounded, ordered log of recent actions. Error reports copy the trail at
//! creation time.

use resq_domain::constants::BREADCRUMB_CAPACITY;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Capped breadcrumb trail, oldest entries dropped first
#[derive(Debug)]
pub struct BreadcrumbTrail {
    entries: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl BreadcrumbTrail {
    /// Create a trail with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(BREADCRUMB_CAPACITY)
    }

    /// Create a trail holding at most `capacity` breadcrumbs
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a breadcrumb, dropping the oldest when full
    pub fn add<S: Into<String>>(&self, text: S) {
        if self.capacity == 0 {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            while entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(text.into());
        }
    }

    /// Copy of the trail, oldest first
    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every breadcrumb
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of breadcrumbs held
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the trail is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BreadcrumbTrail {
    fn default() -> Self {
        Self::new()
    }
}
