//! Aerocrawl engine: fetch, parse, enrich, and persist pipeline.
mod csv;
mod fetch;
mod geocode;
mod harvest;
mod parse;
mod pipeline;
mod sheet;
mod writer;

pub use fetch::{
    FailureKind, FetchError, FetchMetadata, FetchSettings, FetchedPage, PageFetcher,
    ReqwestPageFetcher,
};
pub use geocode::{AddressResolver, GeocoderSettings, HttpAddressResolver};
pub use harvest::{HarvestError, HarvestStats, Harvester};
pub use parse::{discover_page_refs, parse_detail, resolve_categories, scan_listing, ParseError};
pub use pipeline::{
    run_harvest_only, run_pipeline, CrawlPlan, HarvestOnly, PipelineSettings, PipelineSummary,
};
pub use sheet::{CsvBook, SheetError, SheetStore};
pub use writer::{Persister, PersistStats};
