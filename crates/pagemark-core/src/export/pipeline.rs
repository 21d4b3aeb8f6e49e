//! Sequential per-page processing with cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ExportError;
use crate::Result;

/// Shared flag telling a running pipeline to stop before its next page.
///
/// Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}

type ProgressFn<'a> = Box<dyn FnMut(u32, u32) + 'a>;

/// Runs a step for each page in ascending order, one page at a time.
///
/// The token is checked before every page and the progress callback is
/// called with `(done, total)` after every page. A run that stops on the
/// token clears it.
pub struct PagePipeline<'a> {
    token: CancellationToken,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> PagePipeline<'a> {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(u32, u32) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Process `pages` (sorted and de-duplicated first), collecting results.
    pub fn run<T, F>(&mut self, pages: impl IntoIterator<Item = u32>, mut step: F) -> Result<Vec<T>>
    where
        F: FnMut(u32) -> Result<T>,
    {
        let mut pages: Vec<u32> = pages.into_iter().collect();
        pages.sort_unstable();
        pages.dedup();

        let total = pages.len() as u32;
        let mut results = Vec::with_capacity(pages.len());

        for (done, page) in pages.into_iter().enumerate() {
            if self.token.is_cancelled() {
                info!("Cancelled after {} of {} pages", done, total);
                self.token.reset();
                return Err(ExportError::Cancelled {
                    completed: done as u32,
                    total,
                }
                .into());
            }

            results.push(step(page)?);
            debug!("Processed page {} ({}/{})", page, done + 1, total);

            if let Some(progress) = self.progress.as_mut() {
                progress(done as u32 + 1, total);
            }
        }

        Ok(results)
    }
}

impl Default for PagePipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PagemarkError;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn test_pages_run_in_ascending_order_with_progress() {
        let seen = RefCell::new(Vec::new());
        let mut pipeline = PagePipeline::new().with_progress(|done, total| {
            seen.borrow_mut().push((done, total));
        });

        let pages = pipeline.run([3, 1, 2, 3], |page| Ok(page * 10)).unwrap();
        drop(pipeline);

        assert_eq!(pages, vec![10, 20, 30]);
        assert_eq!(seen.into_inner(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_cancellation_stops_before_next_page() {
        let token = CancellationToken::new();
        let mut pipeline = PagePipeline::new().with_token(token.clone());

        let result = pipeline.run(1..=5, |page| {
            if page == 2 {
                token.cancel();
            }
            Ok(page)
        });

        match result {
            Err(PagemarkError::Export(ExportError::Cancelled { completed, total })) => {
                assert_eq!((completed, total), (2, 5));
            }
            other => panic!("expected cancellation, got {:?}", other.map(|v| v.len())),
        }
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_token_reset() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!clone.is_cancelled());
    }
}
