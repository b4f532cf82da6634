use std::time::Duration;

use comparer_logging::cmp_trace;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::ViewerInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Page count and current page both became queryable.
    Loaded { page_count: u32, current_page: u32 },
    /// The ceiling passed first.
    TimedOut,
    Cancelled,
}

/// Checks right away, then every `interval`, until the instance reports a
/// page count and a current page, `ceiling` elapses, or `token` fires.
pub async fn wait_fully_loaded(
    instance: &dyn ViewerInstance,
    interval: Duration,
    ceiling: Duration,
    token: &CancellationToken,
) -> PollOutcome {
    let deadline = time::Instant::now() + ceiling;
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => return PollOutcome::Cancelled,
            _ = time::sleep_until(deadline) => return PollOutcome::TimedOut,
            _ = ticker.tick() => {
                if let Some((page_count, current_page)) = query_pages(instance).await {
                    return PollOutcome::Loaded { page_count, current_page };
                }
            }
        }
    }
}

async fn query_pages(instance: &dyn ViewerInstance) -> Option<(u32, u32)> {
    // Errors just mean the document is still loading.
    let page_count = match instance.total_page_count().await {
        Ok(count) => count?,
        Err(err) => {
            cmp_trace!("page count not available yet: {err}");
            return None;
        }
    };
    let current_page = instance.current_page_index().await.ok().flatten()?;
    (page_count > 0).then_some((page_count, current_page))
}
