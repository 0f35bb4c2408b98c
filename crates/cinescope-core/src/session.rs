//! Auth session shared by every view.
//!
//! [`SessionContext`] is the single writer; views hold a
//! [`SessionSubscription`] and re-derive personalised data on each event.

use cinescope_api::supabase::{LocalAuthApi, Session};
use cinescope_api::{ApiError, ApiResult};
use tokio::sync::watch;
use uuid::Uuid;

/// A change of the signed-in state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// A session was established.
    SignedIn(Session),
    /// The session ended.
    SignedOut,
}

/// Owns the auth client and publishes session changes.
#[derive(Debug)]
pub struct SessionContext<A> {
    auth: A,
    tx: watch::Sender<Option<Session>>,
}

impl<A: LocalAuthApi> SessionContext<A> {
    /// Reads the current session from `auth` and starts publishing.
    ///
    /// A failed read starts signed out.
    pub async fn init(auth: A) -> Self {
        let current = auth.get_session().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read session, starting signed out");
            None
        });
        let (tx, _rx) = watch::channel(current);
        Self { auth, tx }
    }

    /// The auth client.
    pub const fn auth(&self) -> &A {
        &self.auth
    }

    /// Current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// Signed-in user ID.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.tx.borrow().as_ref().map(|s| s.user.id)
    }

    /// Signed-in user ID, or [`ApiError::NoSession`].
    ///
    /// # Errors
    ///
    /// Returns `NoSession` when signed out.
    pub fn require_user(&self) -> ApiResult<Uuid> {
        self.user_id().ok_or(ApiError::NoSession)
    }

    /// Registers a listener for future changes.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: self.tx.subscribe(),
        }
    }

    fn publish(&self, session: Option<Session>) {
        self.tx.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        });
    }

    /// Signs in and publishes the new session.
    ///
    /// # Errors
    ///
    /// Returns the auth error; the published state is unchanged.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<Session> {
        let session = self.auth.sign_in(email, password).await?;
        self.publish(Some(session.clone()));
        Ok(session)
    }

    /// Registers an account. Publishes only when the service signs the
    /// user in immediately (no email confirmation pending).
    ///
    /// # Errors
    ///
    /// Returns the auth error; the published state is unchanged.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> ApiResult<Option<Session>> {
        let session = self.auth.sign_up(email, password, username).await?;
        if let Some(ref s) = session {
            self.publish(Some(s.clone()));
        }
        Ok(session)
    }

    /// Signs out. The signed-out state is published even when the
    /// remote call fails.
    ///
    /// # Errors
    ///
    /// Returns the auth error after publishing.
    pub async fn sign_out(&self) -> ApiResult<()> {
        let result = self.auth.sign_out().await;
        self.publish(None);
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "remote sign-out failed");
        }
        result
    }
}

/// A registered session listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    /// Waits for the next change. `None` once the context is gone.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        self.rx.changed().await.ok()?;
        Some(self.take())
    }

    /// The change published since the last read, without waiting.
    pub fn try_next(&mut self) -> Option<AuthEvent> {
        self.rx.has_changed().ok()?.then(|| self.take())
    }

    fn take(&mut self) -> AuthEvent {
        match &*self.rx.borrow_and_update() {
            Some(session) => AuthEvent::SignedIn(session.clone()),
            None => AuthEvent::SignedOut,
        }
    }

    /// Stops listening.
    pub fn unsubscribe(self) {
        drop(self.rx);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::future_not_send)]

    use std::sync::Mutex;

    use cinescope_api::supabase::AuthUser;

    use super::*;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_owned(),
            refresh_token: None,
            expires_in: Some(3600),
            token_type: String::from("bearer"),
            user: AuthUser {
                id: Uuid::from_u128(7),
                email: Some(String::from("a@example.com")),
                user_metadata: serde_json::Value::Null,
            },
        }
    }

    #[derive(Debug, Default)]
    struct MockAuth {
        stored: Mutex<Option<Session>>,
        fail_sign_out: bool,
        confirm_email: bool,
    }

    impl LocalAuthApi for MockAuth {
        async fn sign_up(
            &self,
            _email: &str,
            _password: &str,
            _username: &str,
        ) -> ApiResult<Option<Session>> {
            if self.confirm_email {
                return Ok(None);
            }
            Ok(Some(session("new")))
        }

        async fn sign_in(&self, _email: &str, password: &str) -> ApiResult<Session> {
            if password != "secret" {
                return Err(ApiError::Auth(String::from("Invalid login credentials")));
            }
            Ok(session("signed-in"))
        }

        async fn sign_out(&self) -> ApiResult<()> {
            if self.fail_sign_out {
                return Err(ApiError::Auth(String::from("sign out: timed out")));
            }
            Ok(())
        }

        async fn get_session(&self) -> ApiResult<Option<Session>> {
            Ok(self.stored.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn test_init_reads_existing_session() {
        // Arrange
        let auth = MockAuth {
            stored: Mutex::new(Some(session("persisted"))),
            ..MockAuth::default()
        };

        // Act
        let ctx = SessionContext::init(auth).await;

        // Assert
        assert_eq!(ctx.current().unwrap().access_token, "persisted");
        assert_eq!(ctx.user_id(), Some(Uuid::from_u128(7)));
    }

    #[tokio::test]
    async fn test_subscriber_sees_sign_in_then_sign_out() {
        // Arrange
        let ctx = SessionContext::init(MockAuth::default()).await;
        let mut sub = ctx.subscribe();

        // Act
        ctx.sign_in("a@example.com", "secret").await.unwrap();
        let first = sub.next().await.unwrap();
        ctx.sign_out().await.unwrap();
        let second = sub.next().await.unwrap();

        // Assert
        assert!(matches!(first, AuthEvent::SignedIn(ref s) if s.access_token == "signed-in"));
        assert_eq!(second, AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_failed_sign_in_publishes_nothing() {
        // Arrange
        let ctx = SessionContext::init(MockAuth::default()).await;

        // Act
        let err = ctx.sign_in("a@example.com", "wrong").await.unwrap_err();

        // Assert
        assert!(err.is_auth());
        assert!(matches!(ctx.require_user(), Err(ApiError::NoSession)));
    }

    #[tokio::test]
    async fn test_sign_out_failure_still_signs_out_locally() {
        // Arrange
        let auth = MockAuth {
            stored: Mutex::new(Some(session("persisted"))),
            fail_sign_out: true,
            ..MockAuth::default()
        };
        let ctx = SessionContext::init(auth).await;

        // Act
        let result = ctx.sign_out().await;

        // Assert
        assert!(result.is_err());
        assert!(ctx.current().is_none());
    }

    #[tokio::test]
    async fn test_pending_confirmation_stays_signed_out() {
        // Arrange
        let auth = MockAuth {
            confirm_email: true,
            ..MockAuth::default()
        };
        let ctx = SessionContext::init(auth).await;

        // Act
        let session = ctx.sign_up("a@example.com", "secret", "neo").await.unwrap();

        // Assert
        assert!(session.is_none());
        assert!(ctx.user_id().is_none());
    }

    #[tokio::test]
    async fn test_try_next_reports_only_unread_changes() {
        // Arrange
        let ctx = SessionContext::init(MockAuth::default()).await;
        let mut sub = ctx.subscribe();

        // Act
        let before = sub.try_next();
        ctx.sign_in("a@example.com", "secret").await.unwrap();
        let after = sub.try_next();
        let again = sub.try_next();

        // Assert
        assert!(before.is_none());
        assert!(matches!(after, Some(AuthEvent::SignedIn(_))));
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_unsubscribed_listener_does_not_block_writer() {
        // Arrange
        let ctx = SessionContext::init(MockAuth::default()).await;
        ctx.subscribe().unsubscribe();

        // Act
        ctx.sign_in("a@example.com", "secret").await.unwrap();

        // Assert
        assert!(ctx.current().is_some());
    }
}
