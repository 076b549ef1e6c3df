//! Bounded-concurrency liveness validation of candidate URLs.
//!
//! A pool of render workers, gated by a semaphore, feeds accepted pages
//! through a single result channel to one coordinator. The coordinator
//! accepts at most `quota` pages and raises a stop signal at quota, after
//! which waiting workers return without rendering and late in-flight
//! results are drained and discarded. The accepted set therefore never
//! exceeds the quota.
//!
//! Acceptance order is completion order, not submission order. Failures
//! (timeouts, navigation errors, thin pages) reject the single URL and are
//! never surfaced as a run failure.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use crate::corpus::ValidatedPage;
use crate::renderer::{RenderContext, Renderer};

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Soft upper bound on accepted pages.
    pub quota: usize,
    /// Maximum in-flight renders.
    pub concurrency: usize,
    /// Hard per-render timeout.
    pub timeout_ms: u64,
    /// Minimum trimmed HTML length for a page to count as live.
    pub min_html_len: usize,
    pub show_progress: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            quota: 200,
            concurrency: 15,
            timeout_ms: 8000,
            min_html_len: 80,
            show_progress: false,
        }
    }
}

/// Validate candidates until the quota is reached or the input runs out.
pub async fn validate(
    renderer: Arc<dyn Renderer>,
    urls: Vec<String>,
    config: &ValidatorConfig,
) -> Vec<ValidatedPage> {
    if urls.is_empty() || config.quota == 0 {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let stop = Arc::new(AtomicBool::new(false));
    let rejected = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::channel::<ValidatedPage>(config.concurrency.max(1));

    let total = urls.len();
    let mut workers = Vec::with_capacity(total);
    for url in urls {
        let semaphore = Arc::clone(&semaphore);
        let stop = Arc::clone(&stop);
        let rejected = Arc::clone(&rejected);
        let tx = tx.clone();
        let renderer = Arc::clone(&renderer);
        let timeout_ms = config.timeout_ms;
        let min_html_len = config.min_html_len;

        workers.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            if stop.load(Ordering::Acquire) {
                return;
            }
            match check_url(renderer.as_ref(), &url, timeout_ms, min_html_len).await {
                Some(page) => {
                    // Past-quota sends fail once the receiver closes; the
                    // page is discarded either way.
                    let _ = tx.send(page).await;
                }
                None => {
                    rejected.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    drop(tx);

    let bar = if config.show_progress {
        let bar = ProgressBar::new(config.quota as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} accepted ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut accepted = Vec::with_capacity(config.quota);
    while let Some(page) = rx.recv().await {
        if accepted.len() < config.quota {
            accepted.push(page);
            bar.inc(1);
            if accepted.len() == config.quota {
                stop.store(true, Ordering::Release);
            }
        }
        // Results arriving past quota are dropped, not re-queued.
    }
    bar.finish_and_clear();

    for worker in workers {
        let _ = worker.await;
    }

    info!(
        "validation accepted {}/{} pages ({} rejected)",
        accepted.len(),
        total,
        rejected.load(Ordering::Relaxed)
    );
    accepted
}

/// Render one URL and apply the acceptance checks.
async fn check_url(
    renderer: &dyn Renderer,
    url: &str,
    timeout_ms: u64,
    min_html_len: usize,
) -> Option<ValidatedPage> {
    let mut context = match renderer.new_context().await {
        Ok(context) => context,
        Err(e) => {
            debug!("no render context for {url}: {e}");
            return None;
        }
    };

    let outcome = render(context.as_mut(), url, timeout_ms).await;
    let _ = context.close().await;

    match outcome {
        Ok((final_url, html)) if html.trim().len() >= min_html_len => Some(ValidatedPage {
            url: url.to_string(),
            final_url,
            html,
            rendered_at: chrono::Utc::now(),
        }),
        Ok(_) => {
            debug!("rejecting {url}: page below minimum content size");
            None
        }
        Err(e) => {
            debug!("rejecting {url}: {e}");
            None
        }
    }
}

async fn render(
    context: &mut dyn RenderContext,
    url: &str,
    timeout_ms: u64,
) -> anyhow::Result<(String, String)> {
    let nav = context.navigate(url, timeout_ms).await?;
    let html = context.html().await?;
    Ok((nav.final_url, html))
}
