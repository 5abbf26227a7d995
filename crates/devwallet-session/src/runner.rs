//! Command queue and the task that drives the controller.
//!
//! [`spawn_session`] moves the controller into a background task that
//! selects over two inputs: commands from [`SessionHandle`]s and events from
//! the wallet provider. Both are applied strictly one at a time, pending
//! events first.
//!
//! A command claims the entities it touches when it is *submitted*, not when
//! it starts, so a second command on the same entity is refused while the
//! first is still queued or running.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use devwallet_provider::ProviderEvent;

use crate::busy::{BusyGuard, BusySet};
use crate::command::{Command, Entity};
use crate::controller::SessionController;
use crate::error::SessionError;
use crate::snapshot::SessionSnapshot;

type Reply = oneshot::Sender<Result<SessionSnapshot, SessionError>>;

struct Envelope {
    command: Command,
    guard: BusyGuard,
    reply: Reply,
}

/// Cloneable front end to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<Envelope>,
    busy: Arc<BusySet>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("busy", &self.busy.snapshot())
            .field("closed", &self.command_tx.is_closed())
            .finish()
    }
}

impl SessionHandle {
    /// Queue `command` and return a receiver for its outcome.
    ///
    /// Fails immediately if an entity the command touches is already claimed
    /// or the session task has stopped.
    pub fn submit(
        &self,
        command: Command,
    ) -> Result<oneshot::Receiver<Result<SessionSnapshot, SessionError>>, SessionError> {
        let guard = self.busy.try_claim(command.entities()).map_err(|entity| {
            warn!(command = command.name(), ?entity, "Command rejected, entity busy");
            SessionError::Precondition(format!(
                "another operation on the {} is in progress",
                entity_label(entity)
            ))
        })?;
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(Envelope {
                command,
                guard,
                reply,
            })
            .map_err(|_| SessionError::Precondition("session has stopped".into()))?;
        Ok(rx)
    }

    /// Submit and wait for completion.
    pub async fn execute(&self, command: Command) -> Result<SessionSnapshot, SessionError> {
        let rx = self.submit(command)?;
        rx.await
            .map_err(|_| SessionError::Precondition("session has stopped".into()))?
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

fn entity_label(entity: Entity) -> &'static str {
    match entity {
        Entity::Account => "connected account",
        Entity::Wallet => "wallet",
    }
}

/// Start the session task. It runs until every handle is dropped.
pub fn spawn_session(controller: SessionController) -> (SessionHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        command_tx,
        busy: controller.busy_set(),
        snapshots: controller.subscribe(),
    };
    let events = controller.provider_events();
    let task = tokio::spawn(session_loop(controller, command_rx, events));
    (handle, task)
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<ProviderEvent>>,
) -> Result<ProviderEvent, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn session_loop(
    mut controller: SessionController,
    mut command_rx: mpsc::UnboundedReceiver<Envelope>,
    mut events: Option<broadcast::Receiver<ProviderEvent>>,
) {
    info!("Session started");
    loop {
        tokio::select! {
            // Events raised while the previous command ran are applied
            // before the next command starts.
            biased;

            event = next_event(&mut events) => {
                match event {
                    Ok(event) => controller.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed provider events");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Provider event stream closed");
                        events = None;
                    }
                }
            }
            envelope = command_rx.recv() => {
                let Some(Envelope { command, guard, reply }) = envelope else {
                    break;
                };
                let result = controller.execute(command).await;
                drop(guard);
                // Republish so the released entities are visible.
                controller.publish();
                if reply.send(result.map(|()| controller.snapshot())).is_err() {
                    debug!("Command caller went away before the reply");
                }
            }
        }
    }
    info!("Session stopped");
}
