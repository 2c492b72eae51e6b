//! Relay from transport notifications to typed async events.
//!
//! # Design
//! One relay owns the notification receiver of exactly one exchange. The
//! mapping lives in `Relay::step`, a small state machine with no I/O:
//!
//! ```text
//! Idle --first notification--> Active --Done/Redirect--> Terminated(End)
//!                                     --Error---------> Terminated(Error)
//! ```
//!
//! `spawn` drives that machine on its own thread, forwarding each mapped
//! message to the destination in arrival order. A redirect ends the relay
//! without an `End` event; the transport does not deliver anything further
//! for that id. Error values skip the response hooks.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::error::ConnectionError;
use crate::event::{
    AsyncChunk, AsyncEnd, AsyncEvent, AsyncHeaders, AsyncMessage, AsyncRedirect, AsyncStatus,
};
use crate::hooks::Hooks;
use crate::http::RequestId;
use crate::transport::{AsyncHandle, Notification};

/// Reason reported when the transport drops its channel mid-exchange.
pub const CLOSED: &str = "closed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    End,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Active,
    Terminated(Termination),
}

pub struct Relay {
    id: RequestId,
    state: RelayState,
    hooks: Arc<dyn Hooks>,
}

impl Relay {
    pub fn new(id: RequestId, hooks: Arc<dyn Hooks>) -> Self {
        Self {
            id,
            state: RelayState::Idle,
            hooks,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, RelayState::Terminated(_))
    }

    /// Map one notification. Returns `None` once the relay has terminated.
    pub fn step(&mut self, notification: Notification) -> Option<AsyncMessage> {
        if self.is_terminated() {
            return None;
        }
        let id = self.id;
        let (message, next) = match notification {
            Notification::Status(code) => {
                let code = self.hooks.process_response_status_code(code);
                (Ok(AsyncEvent::Status(AsyncStatus { id, code })), RelayState::Active)
            }
            Notification::Headers(headers) => {
                let headers = self.hooks.process_response_headers(headers);
                (Ok(AsyncEvent::Headers(AsyncHeaders { id, headers })), RelayState::Active)
            }
            Notification::Chunk(chunk) => {
                let chunk = self.hooks.process_response_chunk(chunk);
                (Ok(AsyncEvent::Chunk(AsyncChunk { id, chunk })), RelayState::Active)
            }
            Notification::Redirect { to, headers } => {
                let headers = self.hooks.process_response_headers(headers);
                (
                    Ok(AsyncEvent::Redirect(AsyncRedirect { id, to, headers })),
                    RelayState::Terminated(Termination::End),
                )
            }
            Notification::Done => (
                Ok(AsyncEvent::End(AsyncEnd { id })),
                RelayState::Terminated(Termination::End),
            ),
            Notification::Error(reason) => (
                Err(ConnectionError::with_id(id, reason)),
                RelayState::Terminated(Termination::Error),
            ),
        };
        self.state = next;
        Some(message)
    }

    /// Terminal error for a transport that hung up before finishing.
    pub fn close(&mut self) -> Option<AsyncMessage> {
        if self.is_terminated() {
            return None;
        }
        self.state = RelayState::Terminated(Termination::Error);
        Some(Err(ConnectionError::with_id(self.id, CLOSED)))
    }

    /// Receive, map and forward until the exchange terminates.
    pub fn run(mut self, handle: AsyncHandle, destination: Sender<AsyncMessage>) {
        while !self.is_terminated() {
            let message = match handle.notifications.recv() {
                Ok(notification) => self.step(notification),
                Err(_) => self.close(),
            };
            let Some(message) = message else { continue };
            if destination.send(message).is_err() {
                debug!(id = %self.id, "async destination hung up, stopping relay");
                return;
            }
        }
    }
}

/// Start a relay thread for `handle`.
pub fn spawn(
    handle: AsyncHandle,
    destination: Sender<AsyncMessage>,
    hooks: Arc<dyn Hooks>,
) -> Result<JoinHandle<()>, ConnectionError> {
    let id = handle.id;
    let relay = Relay::new(id, hooks);
    thread::Builder::new()
        .name(format!("potion-relay-{id}"))
        .spawn(move || relay.run(handle, destination))
        .map_err(|err| {
            warn!(%id, %err, "failed to start relay");
            ConnectionError::with_id(id, err.to_string())
        })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use crossbeam_channel::unbounded;

    use super::*;
    use crate::headers::Headers;
    use crate::hooks::DefaultHooks;

    fn relay() -> Relay {
        Relay::new(RequestId::new(), Arc::new(DefaultHooks))
    }

    #[test]
    fn starts_idle_and_becomes_active() {
        let mut relay = relay();
        assert_eq!(relay.state(), RelayState::Idle);
        relay.step(Notification::Status(200));
        assert_eq!(relay.state(), RelayState::Active);
    }

    #[test]
    fn maps_each_notification() {
        let mut relay = relay();
        let id = relay.id();
        assert_eq!(
            relay.step(Notification::Status(200)),
            Some(Ok(AsyncEvent::Status(AsyncStatus { id, code: 200 })))
        );
        let headers = Headers::from(vec![("Server", "test")]);
        assert_eq!(
            relay.step(Notification::Headers(headers.clone())),
            Some(Ok(AsyncEvent::Headers(AsyncHeaders { id, headers })))
        );
        assert_eq!(
            relay.step(Notification::Chunk(Bytes::from_static(b"a"))),
            Some(Ok(AsyncEvent::Chunk(AsyncChunk {
                id,
                chunk: Bytes::from_static(b"a")
            })))
        );
        assert_eq!(
            relay.step(Notification::Done),
            Some(Ok(AsyncEvent::End(AsyncEnd { id })))
        );
        assert_eq!(relay.state(), RelayState::Terminated(Termination::End));
    }

    #[test]
    fn nothing_after_termination() {
        let mut relay = relay();
        relay.step(Notification::Done);
        assert_eq!(relay.step(Notification::Chunk(Bytes::new())), None);
        assert_eq!(relay.step(Notification::Error("late".into())), None);
        assert_eq!(relay.close(), None);
    }

    #[test]
    fn redirect_terminates_without_end() {
        let mut relay = relay();
        let id = relay.id();
        let message = relay.step(Notification::Redirect {
            to: "http://example.com/next".to_string(),
            headers: Headers::new(),
        });
        assert!(matches!(
            message,
            Some(Ok(AsyncEvent::Redirect(AsyncRedirect { id: got, ref to, .. })))
                if got == id && to == "http://example.com/next"
        ));
        assert_eq!(relay.state(), RelayState::Terminated(Termination::End));
        assert_eq!(relay.step(Notification::Done), None);
    }

    #[test]
    fn error_carries_id_and_reason() {
        let mut relay = relay();
        let id = relay.id();
        let message = relay.step(Notification::Error("timeout".to_string()));
        assert_eq!(message, Some(Err(ConnectionError::with_id(id, "timeout"))));
        assert_eq!(relay.state(), RelayState::Terminated(Termination::Error));
    }

    struct Upper;

    impl Hooks for Upper {
        fn process_response_chunk(&self, chunk: Bytes) -> Bytes {
            Bytes::from(chunk.to_ascii_uppercase())
        }

        fn process_response_status_code(&self, _status_code: u16) -> u16 {
            299
        }
    }

    #[test]
    fn hooks_apply_to_events() {
        let mut relay = Relay::new(RequestId::new(), Arc::new(Upper));
        let id = relay.id();
        assert_eq!(
            relay.step(Notification::Status(200)),
            Some(Ok(AsyncEvent::Status(AsyncStatus { id, code: 299 })))
        );
        assert_eq!(
            relay.step(Notification::Chunk(Bytes::from_static(b"abc"))),
            Some(Ok(AsyncEvent::Chunk(AsyncChunk {
                id,
                chunk: Bytes::from_static(b"ABC")
            })))
        );
    }

    #[test]
    fn spawned_relay_forwards_in_order() {
        let id = RequestId::new();
        let (notify, notifications) = unbounded();
        let (destination, inbox) = unbounded();
        for notification in [
            Notification::Status(200),
            Notification::Chunk(Bytes::from_static(b"a")),
            Notification::Chunk(Bytes::from_static(b"b")),
            Notification::Done,
            Notification::Chunk(Bytes::from_static(b"ignored")),
        ] {
            notify.send(notification).unwrap();
        }
        let handle = AsyncHandle { id, notifications };
        spawn(handle, destination, Arc::new(DefaultHooks))
            .unwrap()
            .join()
            .unwrap();

        let received: Vec<AsyncMessage> = inbox.try_iter().collect();
        assert_eq!(received.len(), 4);
        assert!(matches!(received[0], Ok(AsyncEvent::Status(AsyncStatus { code: 200, .. }))));
        assert!(matches!(received[3], Ok(AsyncEvent::End(_))));
    }

    #[test]
    fn dropped_transport_channel_reports_closed() {
        let id = RequestId::new();
        let (notify, notifications) = unbounded();
        let (destination, inbox) = unbounded();
        notify.send(Notification::Status(200)).unwrap();
        drop(notify);
        spawn(AsyncHandle { id, notifications }, destination, Arc::new(DefaultHooks))
            .unwrap()
            .join()
            .unwrap();

        let received: Vec<AsyncMessage> = inbox.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert_eq!(received[1], Err(ConnectionError::with_id(id, CLOSED)));
    }
}
