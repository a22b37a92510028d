use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Who the process is currently talking to the backend as.
#[derive(Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody has logged in yet, or the user logged out.
    Anonymous,
    Authenticated { token: String, user: Option<String> },
    /// The backend answered 401; the login flow has to run again.
    Expired,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Anonymous => f.write_str("Anonymous"),
            SessionState::Authenticated { user, .. } => f
                .debug_struct("Authenticated")
                .field("token", &"<redacted>")
                .field("user", user)
                .finish(),
            SessionState::Expired => f.write_str("Expired"),
        }
    }
}

/// The process-wide authentication context.
///
/// Constructed once by the application and handed to the fetch layer, which only
/// ever reads the token. The login flow calls [`Session::init`], logout calls
/// [`Session::teardown`], and the fetch layer calls [`Session::invalidate`] when the
/// backend rejects the token. Anyone responsible for re-authentication can
/// [`subscribe`](Session::subscribe) to observe those transitions.
#[derive(Clone, Debug)]
pub struct Session {
    state: Arc<watch::Sender<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Anonymous);
        Self { state: Arc::new(tx) }
    }

    /// A session that is already logged in, e.g. with a token from the environment.
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.init(token, None);
        session
    }

    /// Starts a session after a successful login.
    pub fn init(&self, token: impl Into<String>, user: Option<String>) {
        tracing::info!(user = ?user, "Session initialised.");
        self.state.send_replace(SessionState::Authenticated {
            token: token.into(),
            user,
        });
    }

    /// Ends the session on explicit logout.
    pub fn teardown(&self) {
        tracing::info!("Session torn down.");
        self.state.send_replace(SessionState::Anonymous);
    }

    /// Marks the session as rejected by the backend.
    ///
    /// Only an authenticated session moves to `Expired`; repeated 401s from
    /// requests that were already in flight do not notify subscribers again.
    pub fn invalidate(&self) {
        let changed = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Authenticated { .. }) {
                *state = SessionState::Expired;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::warn!("Session token rejected by the backend; re-authentication required.");
        }
    }

    pub fn token(&self) -> Option<String> {
        match &*self.state.borrow() {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Authenticated { .. })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
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
    fn lifecycle_moves_through_states() {
        let session = Session::new();
        assert_eq!(session.token(), None);

        session.init("abc", Some("ops".to_string()));
        assert_eq!(session.token().as_deref(), Some("abc"));
        assert!(session.is_authenticated());

        session.invalidate();
        assert_eq!(session.state(), SessionState::Expired);
        assert_eq!(session.token(), None);

        session.teardown();
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[test]
    fn invalidate_notifies_once() {
        let session = Session::with_token("abc");
        let mut rx = session.subscribe();
        rx.mark_unchanged();

        session.invalidate();
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        session.invalidate();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let text = format!("{:?}", Session::with_token("super-secret"));
        assert!(!text.contains("super-secret"));
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let clone = session.clone();
        session.init("t", None);
        assert!(clone.is_authenticated());
    }
}
