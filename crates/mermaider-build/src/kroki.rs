//! Mermaid rendering via the Kroki service.
//!
//! Each diagram is sent to `{server_url}/mermaid/svg` with an HTTP POST. Kroki
//! answers `400` with a plain-text diagnostic when the diagram has a syntax
//! error; that text is passed through unchanged as [`RenderError::Diagram`].

use std::time::Duration;

use ureq::Agent;

use crate::consts::{DEFAULT_TIMEOUT, KROKI_ENDPOINT};
use crate::render::{DiagramRenderer, RenderError};

/// Renders diagrams by posting them to a Kroki server.
///
/// The underlying HTTP agent pools connections, so a single renderer should be
/// shared by every render worker.
pub struct KrokiRenderer {
    server_url: String,
    agent: Agent,
}

impl std::fmt::Debug for KrokiRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrokiRenderer")
            .field("server_url", &self.server_url)
            .finish_non_exhaustive()
    }
}

impl KrokiRenderer {
    /// Create a renderer for the given Kroki server URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let renderer = KrokiRenderer::new("https://kroki.io");
    /// ```
    #[must_use]
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_owned(),
            agent: create_agent(DEFAULT_TIMEOUT),
        }
    }

    /// Set HTTP timeout for Kroki requests.
    ///
    /// Default is 30 seconds. Increase for slow networks or large diagrams.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Endpoint URL diagrams are posted to.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/{KROKI_ENDPOINT}/svg", self.server_url)
    }
}

impl DiagramRenderer for KrokiRenderer {
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        let response = self
            .agent
            .post(&self.endpoint())
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| RenderError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            return Err(classify_error(status, &error_body));
        }

        body.read_to_vec()
            .map_err(|e| RenderError::Io(e.to_string()))
    }
}

/// Create HTTP agent with the specified timeout.
///
/// Status codes are not turned into transport errors so the response body
/// (Kroki's diagnostic) stays readable.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Map an error response to a render error.
///
/// Kroki reports diagram syntax errors as `400 Bad Request`; anything else is a
/// service problem.
fn classify_error(status: u16, body: &str) -> RenderError {
    if status == 400 {
        RenderError::Diagram(body.trim().to_owned())
    } else {
        RenderError::Http(format!("HTTP {status}: {}", body.trim()))
    }
}
