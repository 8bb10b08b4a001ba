//! Submitting events to the cluster

use powny_core::{Action, ActionDispatcher, Event};
use serde_json::{Map, Value};

use crate::Result;
use crate::client::{ApiClient, reject_conflict};

const JOBS_PATH: &str = "/v1/jobs";

pub struct EventDispatchClient {
    client: ApiClient,
}

impl EventDispatchClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Submit `event` for asynchronous processing. Returns once the service
    /// has accepted it.
    pub fn send(&self, event: &Event) -> Result<()> {
        let response = self.client.post_json("send event", JOBS_PATH, event)?;
        reject_conflict("send event", &self.client.url(JOBS_PATH), response)?;
        tracing::info!(fields = event.as_map().len(), "event accepted");
        Ok(())
    }
}

/// Forwards rule actions to the cluster as events of the form
/// `{rule, action, ...params}`.
pub struct LiveDispatcher<'a> {
    client: &'a EventDispatchClient,
    sent: usize,
}

impl<'a> LiveDispatcher<'a> {
    pub fn new(client: &'a EventDispatchClient) -> Self {
        Self { client, sent: 0 }
    }

    /// Number of actions forwarded so far
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl ActionDispatcher for LiveDispatcher<'_> {
    fn dispatch(&mut self, rule: &str, action: &Action) -> powny_core::Result<()> {
        let mut document: Map<String, Value> = action
            .params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        document.insert("rule".into(), Value::from(rule));
        document.insert("action".into(), Value::from(action.kind.as_str()));

        self.client.send(&Event::from_value(Value::Object(document))?)?;
        self.sent += 1;
        Ok(())
    }
}
