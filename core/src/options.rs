//! Construction-time overrides for [`Client`].
//!
//! Each option is a [`ClientOption`] that writes one field of the client.
//! Options are applied in order, so a later option wins over an earlier one
//! touching the same field.

use crate::client::Client;
use crate::transport::Transport;

/// A single override applied to a [`Client`] while it is being built.
pub trait ClientOption {
    fn apply(self: Box<Self>, client: &mut Client);
}

/// Use `transport` instead of the default [`crate::UreqTransport`].
pub fn with_transport<T: Transport + 'static>(transport: T) -> WithTransport {
    WithTransport {
        transport: Box::new(transport),
    }
}

/// Send `token` as `Authorization: Bearer <token>` on every request.
pub fn with_access_token(token: impl Into<String>) -> WithAccessToken {
    WithAccessToken {
        token: token.into(),
    }
}

/// Target `endpoint` instead of `https://cloudbuild.googleapis.com`.
pub fn with_endpoint(endpoint: impl Into<String>) -> WithEndpoint {
    WithEndpoint {
        endpoint: endpoint.into(),
    }
}

pub struct WithTransport {
    transport: Box<dyn Transport>,
}

impl ClientOption for WithTransport {
    fn apply(self: Box<Self>, client: &mut Client) {
        client.transport = self.transport;
    }
}

pub struct WithAccessToken {
    token: String,
}

impl ClientOption for WithAccessToken {
    fn apply(self: Box<Self>, client: &mut Client) {
        client.access_token = Some(self.token);
    }
}

pub struct WithEndpoint {
    endpoint: String,
}

impl ClientOption for WithEndpoint {
    fn apply(self: Box<Self>, client: &mut Client) {
        client.endpoint = self.endpoint.trim_end_matches('/').to_string();
    }
}
