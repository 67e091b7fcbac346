//! Per-session UI state
//!
//! The browser surface is single-user: one selection, one pending notice.
//! State lives in an explicit `Session` value behind the shared app state
//! rather than in ambient globals.

use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedSession = Arc<RwLock<Session>>;

/// What the main pane is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Catalog list, nothing selected
    Index,
    /// One track selected for the mixer
    Detail(String),
}

/// One-shot message surfaced on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

#[derive(Debug)]
pub struct Session {
    view: View,
    notice: Option<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: View::Index,
            notice: None,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.view {
            View::Detail(name) => Some(name),
            View::Index => None,
        }
    }

    pub fn open(&mut self, name: String) {
        self.view = View::Detail(name);
    }

    pub fn close(&mut self) {
        self.view = View::Index;
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Consume the pending notice, if any.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_transitions() {
        let mut session = Session::new();
        assert_eq!(session.view(), &View::Index);
        assert!(session.selected().is_none());

        session.open("Test_Song".to_string());
        assert_eq!(session.selected(), Some("Test_Song"));

        session.close();
        assert_eq!(session.view(), &View::Index);
    }

    #[test]
    fn test_notice_is_one_shot() {
        let mut session = Session::new();
        session.push_notice(Notice::Success("done".to_string()));
        assert_eq!(session.take_notice(), Some(Notice::Success("done".to_string())));
        assert_eq!(session.take_notice(), None);
    }
}
