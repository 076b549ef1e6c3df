//! Renderer abstraction for browser-based page rendering.
//!
//! The pipeline treats rendering as an opaque capability: navigate, read
//! the DOM back as HTML, take a screenshot. Chromium (via chromiumoxide)
//! is the real engine; tests inject stubs through these traits.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// Result of navigating to a URL.
#[derive(Debug, Clone)]
pub struct Navigation {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
}

/// A single browser context (tab).
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a hard timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<Navigation>;
    /// Current DOM serialized as HTML.
    async fn html(&self) -> Result<String>;
    /// PNG screenshot of the page.
    async fn screenshot(&self, full_page: bool) -> Result<Vec<u8>>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Renderer used when Chromium is unavailable: every context request
/// fails, which the validator and techniques treat as per-URL rejections.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
