//! End-to-end crawl: Discovery → ListingPage (paginated) → DetailPage.

use std::sync::Arc;

use spindle_core::app::{App, AppBuilder, RetryPolicy, WorkerConfig, WorkerReport};
use spindle_core::crawl::{self, CrawlDeps, DetailPage, Discovery, ListingPage};
use spindle_core::domain::TaskStatus;
use spindle_core::impls::{InMemoryTaskStore, MemorySink, SqliteTaskStore, StaticSite};
use spindle_core::ports::TaskStore;
use spindle_core::typed::{PayloadCodec, Task};

const ROOT: &str = "http://shop.test/";

/// Two categories; "drama" spans two listing pages, "scifi" one.
fn site() -> StaticSite {
    StaticSite::new()
        .with_page(ROOT, "category http://shop.test/drama\ncategory http://shop.test/scifi")
        .with_page(
            "http://shop.test/drama?page=1",
            "item http://shop.test/t/1\nitem http://shop.test/t/2\nnext",
        )
        .with_page("http://shop.test/drama?page=2", "item http://shop.test/t/3")
        .with_page("http://shop.test/scifi?page=1", "item http://shop.test/t/4")
        .with_page("http://shop.test/t/1", "title One")
        .with_page("http://shop.test/t/2", "title Two")
        .with_page("http://shop.test/t/3", "title Three")
        .with_page("http://shop.test/t/4", "title Four")
}

fn app(store: Arc<dyn TaskStore>, site: Arc<StaticSite>, sink: Arc<MemorySink>, config: WorkerConfig) -> App {
    let deps = CrawlDeps::line_format(site).with_sink(sink);
    crawl::install(AppBuilder::new(store), &deps)
        .unwrap()
        .expect_tasks(&crawl::KINDS)
        .worker_config(config)
        .build()
        .unwrap()
}

async fn crawl_to_idle(store: Arc<dyn TaskStore>, site: Arc<StaticSite>, sink: Arc<MemorySink>) -> WorkerReport {
    let app = app(store, site, sink, WorkerConfig::default());
    app.seed_if_empty(&Discovery::new(ROOT)).await.unwrap();
    app.worker().run().await.unwrap()
}

async fn assert_full_crawl(store: &dyn TaskStore, sink: &MemorySink) {
    let records = store.list().await.unwrap();
    let of_kind = |kind: &str| records.iter().filter(|r| r.kind.as_str() == kind).count();

    assert_eq!(of_kind(Discovery::KIND), 1);
    assert_eq!(of_kind(ListingPage::KIND), 3, "one task per listing page");
    assert_eq!(of_kind(DetailPage::KIND), 4);
    assert!(records.iter().all(|r| r.status == TaskStatus::Complete));
    assert!(store.is_empty().await.unwrap());

    let mut pages: Vec<ListingPage> = records
        .iter()
        .filter(|r| r.kind.as_str() == ListingPage::KIND)
        .map(|r| PayloadCodec::decode(r).unwrap())
        .collect();
    pages.sort_by(|a, b| (&a.category, a.page).cmp(&(&b.category, b.page)));
    assert_eq!(
        pages,
        vec![
            ListingPage::first("http://shop.test/drama"),
            ListingPage::first("http://shop.test/drama").next().unwrap(),
            ListingPage::first("http://shop.test/scifi"),
        ]
    );

    let mut titles: Vec<String> = sink.records().into_iter().map(|r| r.title).collect();
    titles.sort();
    assert_eq!(titles, vec!["Four", "One", "Three", "Two"]);
}

#[tokio::test]
async fn crawl_drains_in_memory_store() {
    let store = Arc::new(InMemoryTaskStore::new());
    let sink = Arc::new(MemorySink::new());

    let report = crawl_to_idle(store.clone(), Arc::new(site()), sink.clone()).await;

    assert_eq!(report.completed, 8);
    assert_eq!(report.failed, 0);
    assert_full_crawl(&*store, &sink).await;
}

#[tokio::test]
async fn crawl_drains_sqlite_store() {
    let store = Arc::new(SqliteTaskStore::in_memory().await.unwrap());
    let sink = Arc::new(MemorySink::new());

    let report = crawl_to_idle(store.clone(), Arc::new(site()), sink.clone()).await;

    assert_eq!(report.completed, 8);
    assert_full_crawl(&*store, &sink).await;
}

#[tokio::test]
async fn exploration_is_breadth_first() {
    let store = Arc::new(InMemoryTaskStore::new());
    crawl_to_idle(store.clone(), Arc::new(site()), Arc::new(MemorySink::new())).await;

    let kinds: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.kind.as_str().to_string())
        .collect();
    // root, then both first listing pages before any detail
    assert_eq!(kinds[0], Discovery::KIND);
    assert_eq!(kinds[1], ListingPage::KIND);
    assert_eq!(kinds[2], ListingPage::KIND);
}

#[tokio::test]
async fn flaky_page_is_retried_and_crawl_completes() {
    let site = Arc::new(site().failing("http://shop.test/drama?page=2", 2));
    let store = Arc::new(InMemoryTaskStore::new());
    let sink = Arc::new(MemorySink::new());

    let report = crawl_to_idle(store.clone(), site.clone(), sink.clone()).await;

    assert_eq!(report.failed, 2);
    assert_eq!(report.dead, 0);
    assert_eq!(site.hits("http://shop.test/drama?page=2"), 3);
    assert_full_crawl(&*store, &sink).await;
}

#[tokio::test]
async fn missing_page_is_dead_lettered_without_stalling() {
    // t/4 was never published
    let site = StaticSite::new()
        .with_page(ROOT, "category http://shop.test/scifi")
        .with_page("http://shop.test/scifi?page=1", "item http://shop.test/t/4\nitem http://shop.test/t/5")
        .with_page("http://shop.test/t/5", "title Five");
    let store = Arc::new(InMemoryTaskStore::new());
    let sink = Arc::new(MemorySink::new());
    let config = WorkerConfig {
        retry: RetryPolicy::bounded(2),
        max_tasks: None,
    };
    let app = app(store.clone(), Arc::new(site), sink.clone(), config);
    app.seed_if_empty(&Discovery::new(ROOT)).await.unwrap();

    let report = app.worker().run().await.unwrap();

    assert_eq!(report.dead, 1);
    assert!(store.is_empty().await.unwrap());
    let counts = store.counts().await.unwrap();
    assert_eq!(counts.dead, 1);
    assert_eq!(counts.complete, 3);
    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn restart_resumes_from_durable_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crawl.db");
    let site = Arc::new(site());
    let sink = Arc::new(MemorySink::new());

    // first process stops after three tasks
    {
        let store = SqliteTaskStore::open(&path).await.unwrap();
        let config = WorkerConfig {
            retry: RetryPolicy::default(),
            max_tasks: Some(3),
        };
        let app = app(Arc::new(store.clone()), site.clone(), sink.clone(), config);
        app.seed_if_empty(&Discovery::new(ROOT)).await.unwrap();
        assert_eq!(app.worker().run().await.unwrap().completed, 3);
        store.close().await;
    }

    let store = SqliteTaskStore::open(&path).await.unwrap();
    assert!(!store.is_empty().await.unwrap());
    let app = app(Arc::new(store.clone()), site.clone(), sink.clone(), WorkerConfig::default());
    assert_eq!(app.seed_if_empty(&Discovery::new(ROOT)).await.unwrap(), None);
    let report = app.worker().run().await.unwrap();

    assert_eq!(report.completed, 5);
    assert_full_crawl(&store, &sink).await;
    // no page was fetched twice across the restart
    assert_eq!(site.hits(ROOT), 1);
    assert_eq!(site.hits("http://shop.test/t/1"), 1);
}
