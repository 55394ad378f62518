use std::io;
use std::time::Duration;

use aerocrawl_core::{CompletionFlag, PublishError, Record, RecordQueue};
use crawl_logging::{crawl_error, crawl_info};
use thiserror::Error;
use tokio::runtime::Runtime;

use crate::fetch::{FetchError, PageFetcher};
use crate::geocode::AddressResolver;
use crate::parse::{
    discover_page_refs, parse_detail, resolve_categories, scan_listing, ParseError,
};

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    #[error("record not published: {0}")]
    Publish(#[from] PublishError),
    #[error("runtime unavailable: {0}")]
    Runtime(#[from] io::Error),
    #[error("harvest thread terminated abnormally")]
    Aborted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub categories: u32,
    pub pages: u32,
    pub records: u64,
    pub skipped_rows: u64,
}

/// Walks the category/page/record hierarchy sequentially, enriches each
/// record, and publishes it to the queue as soon as it is complete.
pub struct Harvester<F: PageFetcher> {
    fetcher: F,
    resolver: Option<Box<dyn AddressResolver>>,
    queue: RecordQueue,
    done: CompletionFlag,
    start_url: String,
    categories: Vec<String>,
    publish_timeout: Duration,
}

impl<F: PageFetcher> Harvester<F> {
    pub fn new(
        fetcher: F,
        resolver: Option<Box<dyn AddressResolver>>,
        queue: RecordQueue,
        done: CompletionFlag,
        start_url: String,
        categories: Vec<String>,
        publish_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            queue,
            done,
            start_url,
            categories,
            publish_timeout,
        }
    }

    /// Runs the full traversal. Whatever the outcome, the page fetcher is
    /// released and only then the completion flag is set; the typed error is
    /// handed back for the coordinator to log, never to the persister.
    pub fn run(mut self) -> Result<HarvestStats, HarvestError> {
        let result = Runtime::new()
            .map_err(HarvestError::from)
            .and_then(|runtime| self.traverse(&runtime));

        self.fetcher.release();
        self.done.mark_complete();

        match &result {
            Ok(stats) => crawl_info!(
                "harvest finished: {} record(s) across {} page(s) in {} category(ies), {} row(s) skipped",
                stats.records,
                stats.pages,
                stats.categories,
                stats.skipped_rows
            ),
            Err(err) => crawl_error!("harvest aborted: {err}"),
        }
        result
    }

    fn traverse(&mut self, runtime: &Runtime) -> Result<HarvestStats, HarvestError> {
        crawl_info!("starting crawl at {}", self.start_url);
        let mut stats = HarvestStats::default();

        let index = runtime.block_on(self.fetcher.fetch(&self.start_url))?;
        let categories =
            resolve_categories(&index.html, &index.metadata.final_url, &self.categories);

        for category in categories {
            stats.categories += 1;
            crawl_info!("[{}] listing at {}", category.name, category.entry_url);

            let listing = runtime.block_on(self.fetcher.fetch(category.entry_url.as_str()))?;
            let pages = discover_page_refs(&listing.html, &listing.metadata.final_url);
            crawl_info!("[{}] {} page(s) of records", category.name, pages.len());

            for page in pages {
                stats.pages += 1;
                crawl_info!("[{}] visiting page {}: {}", category.name, page.ordinal, page.url);

                let listing_page = runtime.block_on(self.fetcher.fetch(&page.url))?;
                let (stubs, skipped) = scan_listing(
                    &listing_page.html,
                    &listing_page.metadata.final_url,
                    &category.name,
                );
                stats.skipped_rows += skipped;

                for stub in stubs {
                    let detail = runtime.block_on(self.fetcher.fetch(stub.detail_url.as_str()))?;
                    let fields = parse_detail(&detail.html)?;

                    let coordinates = match &self.resolver {
                        Some(resolver) => {
                            runtime.block_on(resolver.resolve(&stub.address_query()))
                        }
                        None => None,
                    };

                    let record = Record::new(stub, fields, coordinates);
                    self.queue.publish(record, self.publish_timeout)?;
                    stats.records += 1;
                }
            }
        }

        Ok(stats)
    }
}
