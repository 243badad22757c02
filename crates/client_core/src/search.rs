use std::sync::Arc;

use async_trait::async_trait;
use shared::error::CoreResult;
use tracing::info;

/// Receives submitted search text. Whether that filters a cached list or
/// issues a new query is up to the implementation.
#[async_trait]
pub trait SearchSink: Send + Sync {
    async fn submit(&self, query: &str) -> CoreResult<()>;
}

/// Logs the submission and does nothing else.
pub struct NoopSearchSink;

#[async_trait]
impl SearchSink for NoopSearchSink {
    async fn submit(&self, query: &str) -> CoreResult<()> {
        info!(query, "search submitted; no search backend is wired");
        Ok(())
    }
}

/// Text box state for one screen.
pub struct SearchController {
    text: String,
    sink: Arc<dyn SearchSink>,
}

impl SearchController {
    pub fn new(sink: Arc<dyn SearchSink>) -> Self {
        Self {
            text: String::new(),
            sink,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Hands the trimmed text to the sink. Returns `false` without calling it
    /// when the text is empty or whitespace.
    pub async fn submit(&self) -> CoreResult<bool> {
        let query = self.text.trim();
        if query.is_empty() {
            return Ok(false);
        }
        self.sink.submit(query).await?;
        Ok(true)
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(Arc::new(NoopSearchSink))
    }
}
