//! Infinite scroll against a table.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use datatable_lib::DataTable;
use datatable_lib::TableStatus;
use datatable_lib::error::ErrorReporter;
use datatable_lib::error::LoadError;
use datatable_lib::model::ColumnDef;
use datatable_lib::model::Record;
use datatable_lib::scroll::LoadOutcome;
use datatable_lib::scroll::PageLoader;
use datatable_lib::scroll::SkipReason;
use tokio::sync::Notify;

/// Serves numbered pages of two rows, optionally waiting for a gate.
struct Pager {
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
    fail: bool,
}

impl Pager {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: None,
            fail: false,
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageLoader<Record> for Pager {
    async fn load_more(&self) -> Result<Vec<Record>, LoadError> {
        let page = self.calls.fetch_add(1, Ordering::SeqCst) as i64;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return Err(LoadError::failed("backend unavailable"));
        }
        Ok(vec![
            Record::new(page * 2).set("name", format!("row {}", page * 2)),
            Record::new(page * 2 + 1).set("name", format!("row {}", page * 2 + 1)),
        ])
    }
}

fn columns() -> Vec<ColumnDef<Record>> {
    vec![ColumnDef::new("name", "Name").accessor_key("name")]
}

#[tokio::test]
async fn test_load_more_appends_page() {
    let pager = Arc::new(Pager::new());
    let mut table = DataTable::builder(columns()).page_loader(pager.clone()).build().unwrap();

    assert!(table.load_more().await.started());
    assert!(table.load_more().await.started());
    assert_eq!(table.rows().len(), 4);
    assert_eq!(pager.calls(), 2);
    assert_eq!(table.status(), TableStatus::Ready);
}

#[tokio::test]
async fn test_load_more_skips_without_more_or_while_loading() {
    let pager = Arc::new(Pager::new());
    let mut table = DataTable::builder(columns()).page_loader(pager.clone()).build().unwrap();

    table.set_has_more(false);
    assert!(matches!(table.load_more().await, LoadOutcome::Skipped(SkipReason::NoMore)));

    table.set_has_more(true);
    table.set_loading(true);
    assert!(matches!(
        table.load_more().await,
        LoadOutcome::Skipped(SkipReason::CallerLoading)
    ));
    assert_eq!(pager.calls(), 0);
}

#[tokio::test]
async fn test_load_more_without_loader_is_disabled() {
    let mut table = DataTable::builder(columns()).build().unwrap();
    assert!(table.sentinel().is_none());
    assert!(matches!(table.load_more().await, LoadOutcome::Skipped(SkipReason::Disabled)));
}

#[tokio::test]
async fn test_failed_page_is_reported_and_rows_kept() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&reported);
    let mut table = DataTable::builder(columns())
        .rows(vec![Record::new(100).set("name", "existing")])
        .page_loader(Arc::new(Pager::failing()))
        .error_reporter(ErrorReporter::new().with_hook(move |e| log.lock().unwrap().push(e.to_string())))
        .build()
        .unwrap();

    assert!(matches!(table.load_more().await, LoadOutcome::Failed));
    assert_eq!(table.view().len(), 1);
    assert_eq!(table.status(), TableStatus::Ready);
    assert_eq!(reported.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_repeated_visibility_runs_one_load() {
    let gate = Arc::new(Notify::new());
    let pager = Arc::new(Pager::gated(Arc::clone(&gate)));
    let table = DataTable::builder(columns()).page_loader(pager.clone()).build().unwrap();
    let sentinel = table.sentinel().unwrap();

    let first = sentinel.set_visible(true).unwrap();
    while pager.calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(table.is_loading_more());
    assert_eq!(table.loading_more_message(), Some("Loading more..."));

    let second = sentinel.set_visible(true).unwrap();
    let third = sentinel.set_visible(true).unwrap();
    assert!(matches!(second.await.unwrap(), LoadOutcome::Skipped(SkipReason::InFlight)));
    assert!(matches!(third.await.unwrap(), LoadOutcome::Skipped(SkipReason::InFlight)));

    gate.notify_one();
    match first.await.unwrap() {
        LoadOutcome::Loaded(rows) => assert_eq!(rows.len(), 2),
        other => panic!("expected a page, got {:?}", other.started()),
    }
    assert_eq!(pager.calls(), 1);
    assert!(!table.is_loading_more());
}

#[tokio::test]
async fn test_hidden_sentinel_does_not_load() {
    let pager = Arc::new(Pager::new());
    let table = DataTable::builder(columns()).page_loader(pager.clone()).build().unwrap();
    let sentinel = table.sentinel().unwrap();

    let outcome = sentinel.set_visible(false).unwrap().await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Skipped(SkipReason::NotVisible)));
    assert_eq!(pager.calls(), 0);
}
