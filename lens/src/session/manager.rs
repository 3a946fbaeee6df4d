//! SessionStore actor
//!
//! Owns the session state. Every change goes through [`reduce`], so commands
//! are applied one at a time in arrival order and each subscriber sees the
//! same sequence of snapshots.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::messages::{SessionCommand, SessionError, SessionResponse};
use super::state::{SessionState, Transition, reduce};
use crate::orchestrator::Notification;

/// Event broadcast to presentation subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A transition was applied
    StateChanged(Arc<SessionState>),
    /// A user-visible message, one per failed operation
    Notification(Notification),
}

/// Handle to send commands to the SessionStore
#[derive(Clone)]
pub struct SessionStore {
    tx: mpsc::Sender<SessionCommand>,
    /// Broadcast sender for state change notifications
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Spawn a new SessionStore actor with an empty session
    pub fn spawn() -> Self {
        debug!("spawn: called");
        let (tx, rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(64);

        tokio::spawn(actor_loop(Arc::new(SessionState::default()), rx, event_tx.clone()));

        info!("SessionStore spawned");
        Self { tx, event_tx }
    }

    /// Subscribe to state changes and notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Apply a transition and return the new snapshot
    pub async fn dispatch(&self, transition: Transition) -> SessionResponse<Arc<SessionState>> {
        debug!(transition = transition.name(), "dispatch: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Dispatch {
                transition,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)?
    }

    /// Current state
    pub async fn snapshot(&self) -> SessionResponse<Arc<SessionState>> {
        debug!("snapshot: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }

    /// Broadcast a notification in order with state changes
    ///
    /// Returns once the notification has been broadcast.
    pub async fn notify(&self, notification: Notification) -> SessionResponse<()> {
        debug!(title = %notification.title, "notify: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Notify {
                notification,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelError)?;
        reply_rx.await.map_err(|_| SessionError::ChannelError)
    }

    /// Shutdown the SessionStore
    pub async fn shutdown(&self) -> SessionResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ChannelError)
    }
}

/// The actor loop that owns the state and processes commands
async fn actor_loop(
    mut state: Arc<SessionState>,
    mut rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            SessionCommand::Dispatch { transition, reply } => {
                let name = transition.name();
                debug!(transition = name, "actor_loop: Dispatch command");
                let result = match reduce(&state, transition) {
                    Ok(next) => {
                        state = Arc::new(next);
                        // No subscribers is fine
                        let _ = event_tx.send(SessionEvent::StateChanged(state.clone()));
                        Ok(state.clone())
                    }
                    Err(SessionError::InvariantViolated(msg)) => {
                        warn!(transition = name, %msg, "actor_loop: transition rejected by invariant check");
                        Err(SessionError::InvariantViolated(msg))
                    }
                    Err(e) => {
                        debug!(transition = name, error = %e, "actor_loop: transition rejected");
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }

            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(state.clone());
            }

            SessionCommand::Notify { notification, reply } => {
                let _ = event_tx.send(SessionEvent::Notification(notification));
                let _ = reply.send(());
            }

            SessionCommand::Shutdown => {
                info!("SessionStore shutting down");
                break;
            }
        }
    }

    debug!("actor_loop: exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DocumentSlot;

    #[tokio::test]
    async fn test_dispatch_updates_snapshot_and_broadcasts() {
        let store = SessionStore::spawn();
        let mut events = store.subscribe();

        let state = store
            .dispatch(Transition::UploadStarted {
                slot: DocumentSlot::Primary,
            })
            .await
            .unwrap();
        assert_eq!(state.analysis_version, 1);
        assert_eq!(store.snapshot().await.unwrap().analysis_version, 1);

        match events.recv().await.unwrap() {
            SessionEvent::StateChanged(s) => assert_eq!(s.analysis_version, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_transition_leaves_state() {
        let store = SessionStore::spawn();
        let err = store.dispatch(Transition::AnalysisStarted).await.unwrap_err();
        assert!(matches!(err, SessionError::Precondition(_)));
        assert_eq!(*store.snapshot().await.unwrap(), SessionState::default());
    }

    #[tokio::test]
    async fn test_notify_is_broadcast() {
        let store = SessionStore::spawn();
        let mut events = store.subscribe();
        store.notify(Notification::error("Something failed.")).await.unwrap();

        match events.recv().await.unwrap() {
            SessionEvent::Notification(n) => assert_eq!(n.message, "Something failed."),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_notify_is_visible_when_it_returns() {
        let store = SessionStore::spawn();
        let mut events = store.subscribe();

        for i in 0..50 {
            let message = format!("Failure {i}.");
            store.notify(Notification::error(message.clone())).await.unwrap();
            match events.try_recv() {
                Ok(SessionEvent::Notification(n)) => assert_eq!(n.message, message),
                other => panic!("notification {i} not yet broadcast: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_shutdown_closes_channel() {
        let store = SessionStore::spawn();
        store.shutdown().await.unwrap();
        // Commands queued behind Shutdown are dropped with their reply channels
        assert_eq!(store.snapshot().await.unwrap_err(), SessionError::ChannelError);
    }
}
