use std::collections::HashMap;

/// In-progress essay buffers, one per user.
///
/// A buffer exists only between `/essay` and `/done` (or `/cancel`). Messages
/// for one user are assumed to arrive in order.
#[derive(Debug, Default)]
pub struct SessionManager {
    buffers: HashMap<String, String>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh, empty buffer, discarding any unfinished one.
    pub fn start(&mut self, user_id: &str) {
        self.buffers.insert(user_id.to_string(), String::new());
    }

    /// Appends to an open buffer. Returns `false` when the user has no session.
    pub fn append(&mut self, user_id: &str, text: &str) -> bool {
        match self.buffers.get_mut(user_id) {
            Some(buffer) => {
                buffer.push_str(text);
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, user_id: &str) -> bool {
        self.buffers.contains_key(user_id)
    }

    pub fn peek(&self, user_id: &str) -> Option<&str> {
        self.buffers.get(user_id).map(String::as_str)
    }

    /// Closes the session and hands back what was written.
    pub fn take(&mut self, user_id: &str) -> Option<String> {
        self.buffers.remove(user_id)
    }

    pub fn cancel(&mut self, user_id: &str) -> bool {
        self.buffers.remove(user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_start_append_take() {
        let mut sessions = SessionManager::new();
        assert!(!sessions.append("u1", "무시"));
        sessions.start("u1");
        assert!(sessions.append("u1", "첫 줄."));
        assert!(sessions.append("u1", "둘째 줄."));
        assert_eq!(sessions.peek("u1"), Some("첫 줄.둘째 줄."));
        assert_eq!(sessions.take("u1").as_deref(), Some("첫 줄.둘째 줄."));
        assert!(!sessions.is_active("u1"));
        assert_eq!(sessions.take("u1"), None);
    }

    #[test]
    fn restart_discards_previous_buffer() {
        let mut sessions = SessionManager::new();
        sessions.start("u1");
        sessions.append("u1", "old");
        sessions.start("u1");
        assert_eq!(sessions.peek("u1"), Some(""));
    }

    #[test]
    fn users_are_isolated() {
        let mut sessions = SessionManager::new();
        sessions.start("a");
        sessions.start("b");
        sessions.append("a", "에이");
        sessions.append("b", "비");
        assert!(sessions.cancel("a"));
        assert!(!sessions.cancel("a"));
        assert_eq!(sessions.peek("b"), Some("비"));
        assert!(!sessions.is_active("a"));
        assert!(sessions.is_active("b"));
    }
}
