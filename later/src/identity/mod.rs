//! Identity resolution for the task store.
//!
//! The authentication provider is an external collaborator; all the store
//! needs is the resolved state and its transitions. [`AuthState`] starts
//! as [`AuthState::Unresolved`] and moves to signed-in or signed-out as
//! the provider reports; the store observes the [`watch`] channel and
//! switches modes accordingly.

use tokio::sync::watch;

use later_model::UserId;

/// Resolved authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// The provider has not answered yet — the store waits.
    #[default]
    Unresolved,
    /// Nobody is signed in; the store runs local-only.
    SignedOut,
    /// A user is signed in; the store runs remote-backed for them.
    SignedIn(UserId),
}

/// Publisher handle for the authentication adapter (or tests).
#[derive(Debug, Clone)]
pub struct IdentityHandle {
    tx: watch::Sender<AuthState>,
}

impl IdentityHandle {
    /// Publishes a signed-in transition for the given user.
    pub fn sign_in(&self, user: UserId) {
        self.tx.send_replace(AuthState::SignedIn(user));
    }

    /// Publishes a signed-out transition.
    pub fn sign_out(&self) {
        self.tx.send_replace(AuthState::SignedOut);
    }
}

/// Creates an identity channel, initially [`AuthState::Unresolved`].
#[must_use]
pub fn channel() -> (IdentityHandle, watch::Receiver<AuthState>) {
    let (tx, rx) = watch::channel(AuthState::Unresolved);
    (IdentityHandle { tx }, rx)
}
