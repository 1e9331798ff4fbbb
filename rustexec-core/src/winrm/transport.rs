//! Request/response transports for WS-Management

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};

use crate::error::TransportError;

use super::envelope::WsAction;

/// Content type of SOAP 1.2 requests
const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// Synchronous request/response exchange of XML documents
///
/// Implementations decide how the channel is secured and authenticated.
/// One call is one exchange; callers needing a deadline impose it here.
pub trait Transport {
    /// Sends a request document and returns the response document
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the exchange fails.
    fn send_message(&self, request: &str, action: WsAction) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send_message(&self, request: &str, action: WsAction) -> Result<String, TransportError> {
        (**self).send_message(request, action)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_message(&self, request: &str, action: WsAction) -> Result<String, TransportError> {
        (**self).send_message(request, action)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_message(&self, request: &str, action: WsAction) -> Result<String, TransportError> {
        (**self).send_message(request, action)
    }
}

/// HTTP(S) transport with basic authentication
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    url: String,
    username: String,
    password: SecretString,
}

impl HttpTransport {
    /// Creates a transport for the given endpoint
    ///
    /// `accept_invalid_certs` disables certificate verification for HTTPS
    /// endpoints with self-signed certificates.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Http` if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        accept_invalid_certs: bool,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(accept_invalid_certs);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            username: username.into(),
            password,
        })
    }

    /// Returns the endpoint URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn send_message(&self, request: &str, action: WsAction) -> Result<String, TransportError> {
        tracing::trace!(url = %self.url, %action, "Sending WS-Management request");

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", action.uri())
            .body(request.to_string())
            .send()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
