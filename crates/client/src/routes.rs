use std::sync::{Mutex, PoisonError};

pub const DASHBOARD: &str = "/";
pub const NEW_REQUEST: &str = "/new-requests";
pub const REQUESTS: &str = "/requests";
pub const APPROVALS: &str = "/approvals";

/// Moves the user to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Keeps every route it was asked to visit.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.visited.lock().unwrap_or_else(PoisonError::into_inner).push(route.to_string());
    }
}
