mod config;
mod logging;
mod report;

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use aerocrawl_engine::{
    run_harvest_only, run_pipeline, AddressResolver, CrawlPlan, CsvBook, FetchSettings,
    GeocoderSettings, HttpAddressResolver, PipelineSettings, ReqwestPageFetcher,
};
use crawl_logging::{crawl_error, crawl_info};

fn main() -> ExitCode {
    logging::initialize(logging::LogDestination::Both);

    match run() {
        Ok(code) => code,
        Err(err) => {
            crawl_error!("aerocrawl failed: {err:#}");
            eprintln!("aerocrawl failed: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::load(Path::new(&config_path))?;

    let fetcher = ReqwestPageFetcher::new(FetchSettings {
        request_timeout: config.request_timeout(),
        ..FetchSettings::default()
    })
    .context("building the page fetcher")?;

    let plan = CrawlPlan {
        start_url: config.start_url.clone(),
        categories: config.categories.clone(),
        columns: config.columns.clone(),
        with_coordinates: config.with_geocoding,
    };
    let settings = PipelineSettings {
        queue_capacity: config.queue_capacity,
        publish_timeout: config.publish_timeout(),
    };

    if !config.with_persistence {
        // Intentionally partial operating mode: traverse and report, write
        // nothing.
        let run = run_harvest_only(fetcher, &plan, &settings);
        crawl_info!("harvest-only mode collected {} record(s)", run.records.len());
        println!("collected {} record(s), nothing persisted", run.records.len());
        return Ok(match run.outcome {
            Ok(_) => ExitCode::SUCCESS,
            Err(_) => ExitCode::from(1),
        });
    }

    let resolver: Option<Box<dyn AddressResolver>> = if config.with_geocoding {
        let geocoder = GeocoderSettings {
            base_url: config.geocoder.base_url.clone(),
            timeout: Duration::from_secs(config.geocoder.timeout_secs),
            ..GeocoderSettings::default()
        };
        let resolver =
            HttpAddressResolver::new(geocoder).context("building the address resolver")?;
        Some(Box::new(resolver))
    } else {
        None
    };

    let store = CsvBook::open(&config.output_dir)
        .with_context(|| format!("opening sheet book at {}", config.output_dir.display()))?;

    let summary = run_pipeline(fetcher, resolver, store, &plan, &settings)
        .context("initializing the pipeline")?;

    report::write_manifest(&config.output_dir, &summary);

    if let Err(err) = &summary.harvest {
        eprintln!("crawl aborted early: {err}");
    }
    if let Err(err) = &summary.persist {
        eprintln!("persist failed: {err}");
    }
    if let Ok(stats) = &summary.persist {
        println!(
            "done: {} row(s) written to {}",
            stats.rows_written,
            config.output_dir.display()
        );
    }

    Ok(if summary.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
