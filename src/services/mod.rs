//! Operation layer over the connected orchestrator
//!
//! [`Orchestrator`] bundles the request client, the stream client and the
//! singleton stream registry for one session. App and system operations are
//! reached through [`Orchestrator::apps`] and [`Orchestrator::system`].

pub mod apps;
pub mod operation;
pub mod streams;
pub mod system;

pub use apps::AppService;
pub use operation::{OperationHandle, OperationOutcome, OperationUpdate};
pub use streams::{SingletonStreams, StreamPurpose};
pub use system::SystemService;

use std::sync::Arc;
use std::time::Duration;

use crate::remote::{EventStreamClient, RequestClient};
use crate::session::ConnectionSession;

pub struct Orchestrator {
    session: Arc<ConnectionSession>,
    requests: RequestClient,
    streams: EventStreamClient,
    singletons: SingletonStreams,
}

impl Orchestrator {
    pub fn new(session: Arc<ConnectionSession>, request_timeout: Duration) -> Self {
        let requests = RequestClient::new(session.clone()).with_timeout(request_timeout);
        let streams = EventStreamClient::new(session.clone());
        let singletons = SingletonStreams::new(streams.clone());
        Self {
            session,
            requests,
            streams,
            singletons,
        }
    }

    pub fn session(&self) -> &Arc<ConnectionSession> {
        &self.session
    }

    pub fn requests(&self) -> &RequestClient {
        &self.requests
    }

    pub fn streams(&self) -> &EventStreamClient {
        &self.streams
    }

    pub fn singletons(&self) -> &SingletonStreams {
        &self.singletons
    }

    pub fn apps(&self) -> AppService<'_> {
        AppService::new(self)
    }

    pub fn system(&self) -> SystemService<'_> {
        SystemService::new(self)
    }

    /// Close every singleton stream and disconnect within `grace`
    pub async fn shutdown(&self, grace: Duration) {
        self.singletons.close_all();
        self.session.shutdown(grace).await;
    }
}
