use animal_ingest::{
    collectors::{
        AbandonmentCollector, Collector, CollectorKind, RegistrationCollector, ShelterCollector,
    },
    config::Config,
    fetch::{PageFetcher, ReqwestTransport},
    partition::PartitionSource,
    pipeline::{Pipeline, RunAccounting, RunProgress},
    store::{DocumentStore, MemoryStore, MongoStore},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Write into an in-process store instead of MongoDB
    pub dry_run: bool,
    pub quiet: bool,
}

/// Collectors built up front, so every missing key is reported before the
/// first request
enum Prepared {
    Abandonments(AbandonmentCollector),
    Registrations(RegistrationCollector),
    Shelters(ShelterCollector),
}

fn prepare(config: &Config, kind: CollectorKind) -> Result<Prepared> {
    let prepared = match kind {
        CollectorKind::Abandonments => {
            Prepared::Abandonments(AbandonmentCollector::from_config(&config.abandonment)?)
        }
        CollectorKind::Registrations => {
            Prepared::Registrations(RegistrationCollector::from_config(&config.registration)?)
        }
        CollectorKind::Shelters => {
            Prepared::Shelters(ShelterCollector::from_config(&config.shelter)?)
        }
    };
    Ok(prepared)
}

/// Run the given collectors one after another. The first fatal error aborts.
pub async fn run_collectors(
    config: Config,
    kinds: &[CollectorKind],
    options: RunOptions,
) -> Result<RunAccounting> {
    let prepared = kinds
        .iter()
        .map(|kind| prepare(&config, *kind))
        .collect::<Result<Vec<_>>>()?;

    let transport = ReqwestTransport::new(&config.http).context("Failed to build HTTP client")?;
    let fetcher = PageFetcher::new(transport, config.retry.policy());

    let store: Arc<dyn DocumentStore> = if options.dry_run {
        warn!("Dry run: documents are kept in memory and discarded at exit");
        Arc::new(MemoryStore::new())
    } else {
        let store = MongoStore::connect(config.store.connection_url(), &config.store.database)
            .await
            .context("Failed to connect to MongoDB")?;
        Arc::new(store)
    };
    let provision = !options.dry_run && config.store.ensure_indexes;

    let mut total = RunAccounting::default();
    for collector in prepared {
        let accounting = match collector {
            Prepared::Abandonments(collector) => {
                let mut source = collector.partitions(fetcher.clone());
                drive(collector, source.as_mut(), &fetcher, &store, provision, options).await?
            }
            Prepared::Registrations(collector) => {
                let mut source = collector.partitions();
                drive(collector, &mut source, &fetcher, &store, provision, options).await?
            }
            Prepared::Shelters(collector) => {
                let mut source = collector.partitions();
                drive(collector, &mut source, &fetcher, &store, provision, options).await?
            }
        };
        if !options.quiet {
            accounting.print_summary();
        }
        total = total.merge(accounting);
    }

    info!(
        "Run completed, {} total documents written",
        total.written()
    );
    Ok(total)
}

async fn drive<C, P>(
    collector: C,
    source: &mut P,
    fetcher: &PageFetcher<ReqwestTransport>,
    store: &Arc<dyn DocumentStore>,
    provision: bool,
    options: RunOptions,
) -> Result<RunAccounting>
where
    C: Collector,
    P: PartitionSource + ?Sized,
{
    let name = collector.name();
    let pipeline = Pipeline::new(collector, fetcher.clone(), store.clone())
        .with_progress(RunProgress::new(name, options.quiet))
        .with_index_provisioning(provision);
    let accounting = pipeline
        .run(source)
        .await
        .with_context(|| format!("{} run failed", name))?;
    Ok(accounting)
}
