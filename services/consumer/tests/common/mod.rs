//! Shared fixtures: a scripted in-memory queue client and event builders

#![allow(dead_code)]

use async_trait::async_trait;
use consumer_service::{
    ConsumerError, EventHandler, MessageClient, MessageClientFactory, Response, TransportError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use types::header::{
    HDR_CONTEXT_ID, HDR_EVENT_ACTION, HDR_GENERATOR_ID, HDR_MESSAGE_ID, HDR_MESSAGE_TYPE,
    HDR_SERVICE_NAME, HDR_SERVICE_TYPE, HDR_UPDATE_TYPE, HDR_ZONE_ID,
};
use types::{EventInfo, Session};
use url::Url;

pub type Fetch = Result<Response, TransportError>;

/// One recorded `get_message` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub acknowledged: Option<String>,
    pub reader_id: String,
}

/// Serves scripted responses in order, then reports an empty queue
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Fetch>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new(script: impl IntoIterator<Item = Fetch>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn enqueue(&self, fetch: Fetch) {
        self.script.lock().push_back(fetch);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn acknowledged(&self) -> Vec<Option<String>> {
        self.calls().into_iter().map(|call| call.acknowledged).collect()
    }
}

#[async_trait]
impl MessageClient for ScriptedClient {
    async fn get_message(
        &self,
        last_message_id: Option<&str>,
        reader_id: &str,
    ) -> Result<Response, TransportError> {
        self.calls.lock().push(Call {
            acknowledged: last_message_id.map(str::to_string),
            reader_id: reader_id.to_string(),
        });
        let next = self.script.lock().pop_front();
        next.unwrap_or_else(|| Ok(Response::no_content()))
    }
}

/// Hands every reader the same scripted client
pub struct SharedClientFactory {
    pub client: Arc<ScriptedClient>,
    pub created: Mutex<Vec<String>>,
}

impl SharedClientFactory {
    pub fn new(client: Arc<ScriptedClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            created: Mutex::new(Vec::new()),
        })
    }
}

impl MessageClientFactory for SharedClientFactory {
    fn create(
        &self,
        queue_uri: &Url,
        _session: &Session,
    ) -> Result<Arc<dyn MessageClient>, ConsumerError> {
        self.created.lock().push(queue_uri.to_string());
        Ok(self.client.clone())
    }
}

/// Factory that cannot build clients
pub struct BrokenFactory;

impl MessageClientFactory for BrokenFactory {
    fn create(&self, _: &Url, _: &Session) -> Result<Arc<dyn MessageClient>, ConsumerError> {
        Err(ConsumerError::Configuration("no transport configured".to_string()))
    }
}

/// Builder for EVENT responses
pub struct EventResponse {
    response: Response,
}

impl EventResponse {
    pub fn new(message_id: &str, action: &str, service_name: &str) -> Self {
        Self {
            response: Response::new(200)
                .with_header(HDR_MESSAGE_ID, message_id)
                .with_header(HDR_MESSAGE_TYPE, "EVENT")
                .with_header(HDR_EVENT_ACTION, action)
                .with_header(HDR_SERVICE_NAME, service_name)
                .with_header(HDR_GENERATOR_ID, "sis-primary")
                .with_data(format!("<{}/>", service_name), "application/xml"),
        }
    }

    pub fn zone(mut self, zone: &str) -> Self {
        self.response = self.response.with_header(HDR_ZONE_ID, zone);
        self
    }

    pub fn context(mut self, context: &str) -> Self {
        self.response = self.response.with_header(HDR_CONTEXT_ID, context);
        self
    }

    pub fn service_type(mut self, service_type: &str) -> Self {
        self.response = self.response.with_header(HDR_SERVICE_TYPE, service_type);
        self
    }

    pub fn update_type(mut self, update_type: &str) -> Self {
        self.response = self.response.with_header(HDR_UPDATE_TYPE, update_type);
        self
    }

    pub fn build(self) -> Fetch {
        Ok(self.response)
    }
}

/// Records every event it is handed
#[derive(Default)]
pub struct RecordingHandler {
    pub events: Mutex<Vec<EventInfo>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_event(&self, event: EventInfo) {
        self.events.lock().push(event);
    }
}
