//! Infinite scroll: load the next page when the sentinel comes into view.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::ErrorReporter;
use crate::error::LoadError;

/// Fetches the next page of rows.
#[async_trait]
pub trait PageLoader<T>: Send + Sync {
    /// Loads rows to append after the ones already shown.
    async fn load_more(&self) -> Result<Vec<T>, LoadError>;
}

/// Why a trigger did not start a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No page loader is configured.
    Disabled,
    /// The sentinel is not in view.
    NotVisible,
    /// The caller reported there are no more rows.
    NoMore,
    /// The caller is running its own (initial) load.
    CallerLoading,
    /// A load-more is already in flight.
    InFlight,
}

/// Result of a load trigger.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    /// The loader returned these rows.
    Loaded(Vec<T>),
    /// The loader failed; the error was reported.
    Failed,
    /// No load was started.
    Skipped(SkipReason),
}

impl<T> LoadOutcome<T> {
    /// Returns `true` if a load actually ran.
    pub fn started(&self) -> bool {
        !matches!(self, LoadOutcome::Skipped(_))
    }
}

struct Inner<T> {
    loader: Arc<dyn PageLoader<T>>,
    in_flight: Arc<Semaphore>,
    has_more: AtomicBool,
    is_loading: AtomicBool,
    visible: AtomicBool,
    reporter: ErrorReporter,
}

/// Guards page loads so at most one runs at a time.
///
/// A load starts only when the sentinel is visible, the caller reports more
/// rows, the caller is not loading and no load-more is in flight. The
/// in-flight guard is a single-permit semaphore: a second trigger while a
/// load runs is rejected, never queued. The permit is released when the
/// loader finishes, whether it succeeded or failed.
///
/// `has_more` and `is_loading` belong to the caller, who updates them as its
/// data source changes.
///
/// # Example
///
/// ```ignore
/// let scroll: InfiniteScroll<u32> = InfiniteScroll::new(Arc::new(my_loader));
/// scroll.set_has_more(true);
///
/// if let LoadOutcome::Loaded(rows) = scroll.on_sentinel_visible().await {
///     table.append_rows(rows);
/// }
/// ```
pub struct InfiniteScroll<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for InfiniteScroll<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> InfiniteScroll<T> {
    /// Creates a controller around `loader`. `has_more` starts `true`.
    pub fn new(loader: Arc<dyn PageLoader<T>>) -> Self {
        Self::with_reporter(loader, ErrorReporter::default())
    }

    /// Creates a controller that reports load failures to `reporter`.
    pub fn with_reporter(loader: Arc<dyn PageLoader<T>>, reporter: ErrorReporter) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                in_flight: Arc::new(Semaphore::new(1)),
                has_more: AtomicBool::new(true),
                is_loading: AtomicBool::new(false),
                visible: AtomicBool::new(false),
                reporter,
            }),
        }
    }

    pub fn set_has_more(&self, has_more: bool) {
        self.inner.has_more.store(has_more, Ordering::SeqCst);
    }

    pub fn has_more(&self) -> bool {
        self.inner.has_more.load(Ordering::SeqCst)
    }

    /// Sets the caller's own loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.inner.is_loading.store(loading, Ordering::SeqCst);
    }

    pub fn is_loading(&self) -> bool {
        self.inner.is_loading.load(Ordering::SeqCst)
    }

    /// Returns `true` while a load-more is in flight.
    pub fn is_loading_more(&self) -> bool {
        self.inner.in_flight.available_permits() == 0
    }

    /// Returns the last reported sentinel visibility.
    pub fn is_visible(&self) -> bool {
        self.inner.visible.load(Ordering::SeqCst)
    }

    /// Records the sentinel's visibility and loads if it came into view.
    pub async fn on_visibility_change(&self, visible: bool) -> LoadOutcome<T> {
        self.inner.visible.store(visible, Ordering::SeqCst);
        if !visible {
            return LoadOutcome::Skipped(SkipReason::NotVisible);
        }
        self.try_load().await
    }

    /// Shorthand for `on_visibility_change(true)`.
    pub async fn on_sentinel_visible(&self) -> LoadOutcome<T> {
        self.on_visibility_change(true).await
    }

    async fn try_load(&self) -> LoadOutcome<T> {
        if !self.has_more() {
            return LoadOutcome::Skipped(SkipReason::NoMore);
        }
        if self.is_loading() {
            return LoadOutcome::Skipped(SkipReason::CallerLoading);
        }
        let Ok(_permit) = Arc::clone(&self.inner.in_flight).try_acquire_owned() else {
            log::trace!("Load more already in flight");
            return LoadOutcome::Skipped(SkipReason::InFlight);
        };

        log::debug!("Loading more rows");
        match self.inner.loader.load_more().await {
            Ok(rows) => {
                log::debug!("Loaded {} more rows", rows.len());
                LoadOutcome::Loaded(rows)
            }
            Err(e) => {
                self.inner.reporter.report("Load more failed", &e);
                LoadOutcome::Failed
            }
        }
    }

    /// Returns a handle for the host's visibility observer.
    pub fn sentinel(&self) -> Sentinel<T> {
        Sentinel { scroll: self.clone() }
    }
}

/// Visibility handle for the element at the end of the rows.
///
/// Each visibility report runs on the current tokio runtime.
pub struct Sentinel<T> {
    scroll: InfiniteScroll<T>,
}

impl<T: Send + 'static> Sentinel<T> {
    /// Reports visibility; spawns the load. Returns `None` without a runtime.
    pub fn set_visible(&self, visible: bool) -> Option<JoinHandle<LoadOutcome<T>>> {
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("No tokio runtime, ignoring sentinel visibility");
            return None;
        };
        let scroll = self.scroll.clone();
        Some(runtime.spawn(async move { scroll.on_visibility_change(visible).await }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    struct Pages {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PageLoader<u32> for Pages {
        async fn load_more(&self) -> Result<Vec<u32>, LoadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u32;
            if self.fail {
                return Err(LoadError::failed("offline"));
            }
            Ok(vec![call * 10, call * 10 + 1])
        }
    }

    fn pages(fail: bool) -> Arc<Pages> {
        Arc::new(Pages {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test]
    async fn test_loads_when_visible() {
        let loader = pages(false);
        let scroll: InfiniteScroll<u32> = InfiniteScroll::new(loader.clone());
        match scroll.on_sentinel_visible().await {
            LoadOutcome::Loaded(rows) => assert_eq!(rows, vec![0, 1]),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!scroll.is_loading_more());
    }

    #[tokio::test]
    async fn test_guards() {
        let loader = pages(false);
        let scroll: InfiniteScroll<u32> = InfiniteScroll::new(loader.clone());

        assert!(matches!(
            scroll.on_visibility_change(false).await,
            LoadOutcome::Skipped(SkipReason::NotVisible)
        ));

        scroll.set_loading(true);
        assert!(matches!(
            scroll.on_sentinel_visible().await,
            LoadOutcome::Skipped(SkipReason::CallerLoading)
        ));

        scroll.set_loading(false);
        scroll.set_has_more(false);
        assert!(matches!(
            scroll.on_sentinel_visible().await,
            LoadOutcome::Skipped(SkipReason::NoMore)
        ));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_releases_guard_and_keeps_has_more() {
        let loader = pages(true);
        let scroll: InfiniteScroll<u32> = InfiniteScroll::new(loader.clone());
        assert!(matches!(scroll.on_sentinel_visible().await, LoadOutcome::Failed));
        assert!(scroll.has_more());
        assert!(!scroll.is_loading_more());
        assert!(matches!(scroll.on_sentinel_visible().await, LoadOutcome::Failed));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sentinel_without_runtime() {
        let scroll: InfiniteScroll<u32> = InfiniteScroll::new(pages(false));
        assert!(scroll.sentinel().set_visible(true).is_none());
    }
}
