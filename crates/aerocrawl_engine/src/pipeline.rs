use std::thread;
use std::time::Duration;

use aerocrawl_core::{record_channel, Record};
use crawl_logging::{crawl_error, crawl_info};

use crate::fetch::PageFetcher;
use crate::geocode::AddressResolver;
use crate::harvest::{HarvestError, HarvestStats, Harvester};
use crate::sheet::{SheetError, SheetStore};
use crate::writer::{PersistStats, Persister};

/// What to crawl and how to lay out the output sections.
#[derive(Debug, Clone)]
pub struct CrawlPlan {
    pub start_url: String,
    pub categories: Vec<String>,
    pub columns: Vec<String>,
    /// Append latitude/longitude columns to every row.
    pub with_coordinates: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub queue_capacity: usize,
    pub publish_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            publish_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of a full crawl-and-persist run. The document is finalized before
/// this is returned, whatever the harvest outcome was.
#[derive(Debug)]
pub struct PipelineSummary {
    pub harvest: Result<HarvestStats, HarvestError>,
    pub persist: Result<PersistStats, SheetError>,
}

impl PipelineSummary {
    pub fn succeeded(&self) -> bool {
        self.harvest.is_ok() && self.persist.is_ok()
    }
}

/// Outcome of the harvest-only operating mode: records are collected in
/// memory and never persisted.
#[derive(Debug)]
pub struct HarvestOnly {
    pub records: Vec<Record>,
    pub outcome: Result<HarvestStats, HarvestError>,
}

/// Wires harvester and persister to a shared bounded queue and completion
/// flag, runs both to completion on their own threads, and returns once the
/// document has been finalized.
pub fn run_pipeline<F, S>(
    fetcher: F,
    resolver: Option<Box<dyn AddressResolver>>,
    store: S,
    plan: &CrawlPlan,
    settings: &PipelineSettings,
) -> Result<PipelineSummary, SheetError>
where
    F: PageFetcher + 'static,
    S: SheetStore + 'static,
{
    let (queue, drain, done) = record_channel(settings.queue_capacity);

    let persister = Persister::new(
        drain,
        done.clone(),
        store,
        &plan.categories,
        &plan.columns,
        plan.with_coordinates,
    )?;
    let harvester = Harvester::new(
        fetcher,
        resolver,
        queue,
        done.clone(),
        plan.start_url.clone(),
        plan.categories.clone(),
        settings.publish_timeout,
    );

    let harvest_handle = thread::spawn(move || harvester.run());
    let persist_handle = thread::spawn(move || persister.run());

    let harvest = match harvest_handle.join() {
        Ok(result) => result,
        Err(_) => {
            // A panicked harvester never reached its completion guard; flip
            // the flag here so the persister can still finalize.
            crawl_error!("harvest thread panicked");
            done.mark_complete();
            Err(HarvestError::Aborted)
        }
    };

    let persist = match persist_handle.join() {
        Ok(result) => result,
        Err(_) => {
            crawl_error!("persist thread panicked");
            Err(SheetError::OutputDir("persist thread panicked".into()))
        }
    };

    if let Ok(stats) = &persist {
        crawl_info!("pipeline finished: {} row(s) written", stats.rows_written);
    }

    Ok(PipelineSummary { harvest, persist })
}

/// Degenerate operating mode: runs only the harvester and hands the records
/// back in memory. Distinct from the full pipeline on purpose; nothing is
/// written anywhere.
pub fn run_harvest_only<F>(fetcher: F, plan: &CrawlPlan, settings: &PipelineSettings) -> HarvestOnly
where
    F: PageFetcher + 'static,
{
    let (queue, drain, done) = record_channel(settings.queue_capacity);

    let harvester = Harvester::new(
        fetcher,
        None,
        queue,
        done.clone(),
        plan.start_url.clone(),
        plan.categories.clone(),
        settings.publish_timeout,
    );
    let handle = thread::spawn(move || harvester.run());

    let mut records = Vec::new();
    while !done.is_complete() {
        if let Some(record) = drain.next_within(Duration::from_millis(50)) {
            records.push(record);
        }
    }
    records.extend(drain.drain_now());

    let outcome = match handle.join() {
        Ok(result) => result,
        Err(_) => {
            crawl_error!("harvest thread panicked");
            Err(HarvestError::Aborted)
        }
    };

    HarvestOnly { records, outcome }
}
