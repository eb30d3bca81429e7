pub mod chrome;
pub mod snapshot;

pub use chrome::{BrowserMode, BrowserSettings, ChromeContext};
pub use snapshot::{InteractiveElement, PageSnapshot};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// One browser plus the tab the agent drives.
///
/// Elements are addressed by the index assigned in the latest snapshot.
#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn snapshot(&self) -> Result<PageSnapshot>;

    async fn click(&self, index: usize) -> Result<()>;

    async fn input_text(&self, index: usize, text: &str) -> Result<()>;

    async fn scroll(&self, direction: ScrollDirection) -> Result<()>;

    async fn go_back(&self) -> Result<()>;

    /// Release the tab and, when owned, the browser process
    async fn close(&self) -> Result<()>;
}

/// Runs `work` against `context` and closes the context afterwards,
/// whether or not `work` succeeded.
pub async fn with_context<C, T, F, Fut>(context: Arc<C>, work: F) -> Result<T>
where
    C: BrowserContext + ?Sized,
    F: FnOnce(Arc<C>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let result = work(context.clone()).await;

    if let Err(e) = context.close().await {
        warn!("Failed to close browser context: {:#}", e);
    }

    result
}
