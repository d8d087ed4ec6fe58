//! Internal constants for the build pipeline.

use std::time::Duration;

/// File extension of rendered targets.
pub const TARGET_EXTENSION: &str = "svg";

/// Smallest width, in user units, written when fixed-width output is requested.
pub const MIN_FIXED_WIDTH: f64 = 100.0;

/// XML declaration prepended to fixed-width output.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Default HTTP timeout for Kroki requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Kroki endpoint for Mermaid diagrams.
pub const KROKI_ENDPOINT: &str = "mermaid";
