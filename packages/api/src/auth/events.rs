use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;
use std::sync::Arc;

use super::AuthUser;

/// Something that happened to the backend session.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(AuthUser),
    SignedOut,
    TokenRefreshed(AuthUser),
    UserUpdated(AuthUser),
}

impl AuthEvent {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::SignedIn(u) | Self::TokenRefreshed(u) | Self::UserUpdated(u) => Some(u),
            Self::SignedOut => None,
        }
    }
}

/// Stream of auth events for one subscriber.
pub type AuthEvents = UnboundedReceiver<AuthEvent>;

/// Fan-out point shared by backend implementations.
#[derive(Clone, Debug, Default)]
pub struct AuthEventHub {
    subscribers: Arc<Mutex<Vec<UnboundedSender<AuthEvent>>>>,
}

impl AuthEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> AuthEvents {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber, dropping closed ones.
    pub fn emit(&self, event: AuthEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_every_subscriber_receives_events() {
        let hub = AuthEventHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.emit(AuthEvent::SignedOut);

        assert_eq!(a.next().await, Some(AuthEvent::SignedOut));
        assert_eq!(b.next().await, Some(AuthEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_closed_subscribers_are_pruned() {
        let hub = AuthEventHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(hub.subscriber_count(), 2);

        hub.emit(AuthEvent::SignedOut);
        assert_eq!(hub.subscriber_count(), 1);
        drop(kept);
    }
}
