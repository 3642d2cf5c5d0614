//! Tracking of streams that must have at most one live instance

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::errors::Result;
use crate::remote::{EventStreamClient, StreamHandlers, Subscription};

/// Logical purposes served by a single stream at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamPurpose {
    /// Global app-list change feed
    AppEvents,
    /// Log tail of the app currently being watched
    LogTail,
}

/// Opening a stream for a purpose closes the previous stream for that purpose first
pub struct SingletonStreams {
    client: EventStreamClient,
    open: Mutex<HashMap<StreamPurpose, Subscription>>,
}

impl SingletonStreams {
    pub fn new(client: EventStreamClient) -> Self {
        Self {
            client,
            open: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<StreamPurpose, Subscription>> {
        self.open
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self, purpose: StreamPurpose, path: &str, handlers: StreamHandlers) -> Result<()> {
        // Close outside the lock so on_close handlers may use this registry
        let previous = self.lock().remove(&purpose);
        if let Some(previous) = previous {
            log::debug!("Replacing {:?} stream {}", purpose, previous.path());
            previous.close();
        }

        let subscription = self.client.open_stream(path, handlers)?;
        let displaced = self.lock().insert(purpose, subscription);
        if let Some(displaced) = displaced {
            displaced.close();
        }
        Ok(())
    }

    /// Close the stream for `purpose`, if any
    pub fn close(&self, purpose: StreamPurpose) {
        let previous = self.lock().remove(&purpose);
        if let Some(previous) = previous {
            previous.close();
        }
    }

    pub fn close_all(&self) {
        let all: Vec<_> = self.lock().drain().map(|(_, sub)| sub).collect();
        for subscription in all {
            subscription.close();
        }
    }

    /// True while a stream for `purpose` is registered and still open
    pub fn is_open(&self, purpose: StreamPurpose) -> bool {
        self.lock()
            .get(&purpose)
            .is_some_and(|sub| !sub.is_closed())
    }

    pub fn path(&self, purpose: StreamPurpose) -> Option<String> {
        self.lock().get(&purpose).map(|sub| sub.path().to_string())
    }

    /// Token cancelled when the current stream for `purpose` closes
    pub fn close_token(&self, purpose: StreamPurpose) -> Option<CancellationToken> {
        self.lock().get(&purpose).map(Subscription::cancel_token)
    }
}
