//! Contract with the network client that talks to the remote queue
//!
//! The HTTP/XML client itself lives outside this crate. Readers only see a
//! decoded [`Response`] or a [`TransportError`].

use async_trait::async_trait;
use std::sync::Arc;
use types::header::HDR_MESSAGE_ID;
use types::{HeaderProperties, Session};
use url::Url;

use crate::error::{Result, TransportError};

/// Queue had nothing pending
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_OK: u16 = 200;

/// Error payload carried by a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetails {
    pub code: u16,
    pub scope: Option<String>,
    pub message: String,
    pub description: Option<String>,
}

impl ErrorDetails {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            scope: None,
            message: message.into(),
            description: None,
        }
    }
}

/// Decoded response to a single fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub error: Option<ErrorDetails>,
    pub headers: HeaderProperties,
    /// Payload as delivered, not unmarshalled
    pub data: Option<String>,
    pub media_type: Option<String>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Empty queue
    pub fn no_content() -> Self {
        Self::new(STATUS_NO_CONTENT)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_data(mut self, data: impl Into<String>, media_type: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_error(mut self, error: ErrorDetails) -> Self {
        self.error = Some(error);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Any error payload makes this an error response, whatever the status
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_no_content(&self) -> bool {
        self.status == STATUS_NO_CONTENT
    }

    /// Id the next fetch must echo back to acknowledge this message
    pub fn message_id(&self) -> Option<&str> {
        self.headers.get(HDR_MESSAGE_ID)
    }
}

/// Fetches messages from one remote queue
#[async_trait]
pub trait MessageClient: Send + Sync {
    /// Fetch the next message.
    ///
    /// `last_message_id` acknowledges (removes) the message returned by the
    /// previous call; `None` acknowledges nothing.
    async fn get_message(
        &self,
        last_message_id: Option<&str>,
        reader_id: &str,
    ) -> std::result::Result<Response, TransportError>;
}

/// Creates a client bound to one queue URI and session
pub trait MessageClientFactory: Send + Sync {
    fn create(&self, queue_uri: &Url, session: &Session) -> Result<Arc<dyn MessageClient>>;
}
