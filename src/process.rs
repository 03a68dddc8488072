use std::sync::Arc;

use chrono::Local;
use reqwest::Client;
use tokio::{
    sync::{mpsc, Mutex},
    task::{spawn_blocking, JoinSet},
};
use tracing::{debug, warn};

use crate::config::CrawlConfig;
use crate::parse::Extractor;
use crate::record::Record;
use crate::request::{build_client, listing_pages, listing_url, request_page_html, RequestTarget};
use crate::seed::{Entity, SeedKind, SeedSet};
use crate::{info_time, Result};

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub records: Vec<Record>,
    pub requested: usize,
    /// Targets dropped after retries ran out.
    pub failed: usize,
    /// Pages fetched fine that yielded no record.
    pub empty: usize,
}

#[derive(Debug, Default)]
struct WorkerStats {
    failed: usize,
    empty: usize,
}

/// Fetches and extracts every target with at most `config.concurrency`
/// requests in flight. A target that keeps failing is logged and dropped;
/// it never stops the run. Output order is not defined.
pub async fn crawl(config: &CrawlConfig, targets: Vec<RequestTarget>) -> Result<CrawlOutcome> {
    let start_time = Local::now();
    let client = build_client(config)?;
    let extractor = Arc::new(Extractor::new()?);
    let config = Arc::new(config.clone());
    let requested = targets.len();
    info_time!("Started crawling {requested} targets");

    // Work queue: the whole target list goes in up front, workers pull from it.
    let (target_tx, target_rx) = mpsc::channel(requested.max(1));
    for target in targets {
        target_tx.send(target).await?;
    }
    drop(target_tx);
    let target_rx = Arc::new(Mutex::new(target_rx));

    let (record_tx, record_rx) = mpsc::channel(256);
    let collect_handle = tokio::spawn(async move { collect_records(record_rx).await });

    let mut workers = JoinSet::new();
    for _ in 0..config.concurrency.min(requested.max(1)) {
        workers.spawn({
            let client = client.clone();
            let extractor = extractor.clone();
            let config = config.clone();
            let target_rx = target_rx.clone();
            let record_tx = record_tx.clone();
            async move { run_worker(client, extractor, config, target_rx, record_tx).await }
        });
    }
    drop(record_tx);

    let mut outcome = CrawlOutcome {
        requested,
        ..CrawlOutcome::default()
    };
    while let Some(stats) = workers.join_next().await {
        let stats = stats??;
        outcome.failed += stats.failed;
        outcome.empty += stats.empty;
    }
    outcome.records = collect_handle.await??;

    info_time!(
        start_time,
        "Finished crawling: {} records, {} failed, {} empty, {} requested",
        outcome.records.len(),
        outcome.failed,
        outcome.empty,
        requested
    );
    Ok(outcome)
}

/// Pulls targets until the queue is empty. Fetch, extract and hand-off happen
/// as one unit per target.
async fn run_worker(
    client: Client,
    extractor: Arc<Extractor>,
    config: Arc<CrawlConfig>,
    target_rx: Arc<Mutex<mpsc::Receiver<RequestTarget>>>,
    record_tx: mpsc::Sender<Record>,
) -> Result<WorkerStats> {
    let mut stats = WorkerStats::default();
    loop {
        let next = target_rx.lock().await.recv().await;
        let Some(target) = next else {
            break;
        };

        let html = match request_page_html(&client, &target.url, &config).await {
            Ok(html) => html,
            Err(e) => {
                warn!(entity = %target.entity_id, year = ?target.year, error = %e, "dropping target");
                stats.failed += 1;
                continue;
            }
        };

        let record = spawn_blocking({
            let extractor = extractor.clone();
            let years = config.years;
            move || extractor.extract(&target, &html, years)
        })
        .await?;

        match record {
            Some(record) => record_tx.send(record).await?,
            None => stats.empty += 1,
        }
    }
    Ok(stats)
}

/// Uses a `mpsc` Receiver to collect the records into a single `Vec`.
async fn collect_records(mut record_rx: mpsc::Receiver<Record>) -> Result<Vec<Record>> {
    let mut col = Vec::new();
    while let Some(record) = record_rx.recv().await {
        debug!(entity = record.team_id(), year = ?record.year(), "received record");
        col.push(record);
    }
    Ok(col)
}

/// Scrapes the ranking listing pages into a seed list. Pages are fetched
/// concurrently but folded in page order, so the first page an identifier
/// shows up on is the one that is kept.
pub async fn collect_seeds(config: &CrawlConfig, kind: SeedKind, pages: Option<u32>) -> Result<Vec<Entity>> {
    let start_time = Local::now();
    let client = build_client(config)?;
    let extractor = Arc::new(Extractor::new()?);
    let config = Arc::new(config.clone());
    let pages = pages.unwrap_or_else(|| listing_pages(kind));
    let semaphore = Arc::new(tokio::sync::Semaphore::new(config.concurrency));

    let mut task_set = JoinSet::new();
    for page in 1..=pages {
        task_set.spawn({
            // Client uses Arc so we can clone cheaply
            let client = client.clone();
            let extractor = extractor.clone();
            let config = config.clone();
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let url = listing_url(&config.base_url, kind, page);
                let html = request_page_html(&client, &url, &config).await;
                let rows = match html {
                    Ok(html) => spawn_blocking(move || extractor.listing(&html, page, kind)).await?,
                    Err(e) => {
                        warn!(page, error = %e, "dropping listing page");
                        Vec::new()
                    }
                };
                Ok::<_, crate::Error>((page, rows))
            }
        });
    }

    let mut by_page = Vec::with_capacity(pages as usize);
    while let Some(task) = task_set.join_next().await {
        by_page.push(task??);
    }
    by_page.sort_by_key(|(page, _)| *page);

    let mut seeds = SeedSet::new();
    let mut duplicates = 0usize;
    for entity in by_page.into_iter().flat_map(|(_, rows)| rows) {
        if !seeds.insert(entity) {
            duplicates += 1;
        }
    }
    info_time!(
        start_time,
        "Collected {} {kind:?} seeds from {pages} pages ({duplicates} duplicates dropped)",
        seeds.len()
    );
    Ok(seeds.into_entities())
}
