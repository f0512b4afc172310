//! Sync orchestration: catalog → eligibility → auction history → file patch
//!
//! A run moves strictly forward through [`SyncState`]s and reports progress
//! as [`SyncEvent`]s over an unbounded channel. Per-item work inside a phase
//! runs concurrently behind a semaphore, results are stored by index so the
//! item list keeps catalog order.

use crate::catalog::CatalogClient;
use crate::config::SyncConfig;
use crate::eligibility::EligibilityFilter;
use crate::error::{Result, SyncError};
use crate::market::MarketClient;
use crate::models::{CatalogEntry, Item, ItemId, ItemPrice};
use crate::patcher::{patch_file, PatchReport};
use crate::pricing::aggregate;
use std::fmt;
use std::fs::OpenOptions;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

/// Pipeline stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    ListingCatalog,
    FilteringEligible,
    FetchingHistory,
    Patching,
    Done,
    Failed,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    /// Eligible items in catalog order, each with its price attached
    pub items: Vec<Item>,
    pub patch: PatchReport,
    /// Items whose history could not be fetched and were priced at 0
    pub fallback_count: usize,
}

/// Progress notification emitted during a run
#[derive(Debug, Clone)]
pub enum SyncEvent {
    StateChanged(SyncState),
    /// Free-text status line
    Status(String),
    CatalogListed {
        entries: usize,
    },
    FilterProgress {
        processed: usize,
        total: usize,
    },
    FilteringComplete {
        eligible: usize,
    },
    HistoryProgress {
        processed: usize,
        total: usize,
    },
    FilePatched {
        lines_rewritten: usize,
    },
    Succeeded(SyncSummary),
    Failed {
        message: String,
    },
    /// Always the last event of a run
    Finished,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::StateChanged(state) => write!(f, "State: {:?}", state),
            SyncEvent::Status(message) => f.write_str(message),
            SyncEvent::CatalogListed { entries } => write!(f, "Fetched items ({})", entries),
            SyncEvent::FilterProgress { processed, total } => {
                write!(f, "Filtered crafting items ({}/{})", processed, total)
            }
            SyncEvent::FilteringComplete { eligible } => {
                write!(
                    f,
                    "Filtered crafting items - Completed ({} found)",
                    eligible
                )
            }
            SyncEvent::HistoryProgress { processed, total } => {
                write!(
                    f,
                    "Processed auction history of item ({}/{})",
                    processed, total
                )
            }
            SyncEvent::FilePatched { lines_rewritten } => {
                write!(f, "Edited .lang file ({} lines)", lines_rewritten)
            }
            SyncEvent::Succeeded(summary) => write!(
                f,
                "Sync succeeded: {} items priced, {} lines rewritten",
                summary.items.len(),
                summary.patch.lines_rewritten
            ),
            SyncEvent::Failed { message } => write!(f, "Error: {}", message),
            SyncEvent::Finished => f.write_str("Process completed"),
        }
    }
}

/// Event channel plus cancellation flag shared with the caller
struct Reporter {
    sender: UnboundedSender<SyncEvent>,
    cancelled: Arc<AtomicBool>,
}

impl Reporter {
    /// Emit at a cancellation point: fails if the caller cancelled or went away
    fn emit(&self, event: SyncEvent) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(SyncError::Cancelled);
        }
        self.sender.send(event).map_err(|_| SyncError::Cancelled)
    }

    /// Emit without a cancellation check, for events after patching started
    fn notify(&self, event: SyncEvent) {
        let _ = self.sender.send(event);
    }
}

/// Handle to a run started with [`SyncPipeline::spawn`]
pub struct SyncHandle {
    pub events: UnboundedReceiver<SyncEvent>,
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<Result<SyncSummary>>,
}

impl SyncHandle {
    /// Abandon the run at the next event boundary. Has no effect once patching started.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.events.recv().await
    }

    /// Wait for the run to end
    pub async fn wait(self) -> Result<SyncSummary> {
        self.task.await?
    }
}

pub struct SyncPipeline {
    catalog: Arc<CatalogClient>,
    market: Arc<MarketClient>,
    filter: Arc<EligibilityFilter>,
    concurrency: usize,
    retry_delay: Duration,
}

impl SyncPipeline {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            catalog: Arc::new(CatalogClient::new(client.clone(), config)),
            market: Arc::new(MarketClient::new(client, config)),
            filter: Arc::new(EligibilityFilter::from_config(config)),
            concurrency: config.concurrency.max(1),
            retry_delay: config.retry_delay(),
        })
    }

    /// Start a run on a background task
    pub fn spawn(self, file_path: impl Into<PathBuf>) -> SyncHandle {
        let (sender, events) = unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let reporter = Reporter {
            sender,
            cancelled: Arc::clone(&cancelled),
        };
        let file_path = file_path.into();

        let task = tokio::spawn(async move { self.execute(&file_path, &reporter).await });

        SyncHandle {
            events,
            cancelled,
            task,
        }
    }

    /// Run to completion, reporting to `sender`. Always ends with `Finished`.
    pub async fn run(
        &self,
        file_path: &Path,
        sender: UnboundedSender<SyncEvent>,
    ) -> Result<SyncSummary> {
        let reporter = Reporter {
            sender,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.execute(file_path, &reporter).await
    }

    async fn execute(&self, file_path: &Path, reporter: &Reporter) -> Result<SyncSummary> {
        let result = self.sync(file_path, reporter).await;
        match &result {
            Ok(summary) => {
                log::info!(
                    "Sync completed: {} items, {} lines rewritten",
                    summary.items.len(),
                    summary.patch.lines_rewritten
                );
                reporter.notify(SyncEvent::StateChanged(SyncState::Done));
                reporter.notify(SyncEvent::Succeeded(summary.clone()));
            }
            Err(e) => {
                log::error!("Sync failed: {}", e);
                reporter.notify(SyncEvent::StateChanged(SyncState::Failed));
                reporter.notify(SyncEvent::Failed {
                    message: e.to_string(),
                });
            }
        }
        reporter.notify(SyncEvent::Finished);
        result
    }

    async fn sync(&self, file_path: &Path, reporter: &Reporter) -> Result<SyncSummary> {
        check_target(file_path)?;

        reporter.emit(SyncEvent::StateChanged(SyncState::ListingCatalog))?;
        reporter.emit(SyncEvent::Status("Fetching JSON file list...".to_string()))?;
        let entries = self.catalog.list_entries().await?;
        reporter.emit(SyncEvent::CatalogListed {
            entries: entries.len(),
        })?;

        reporter.emit(SyncEvent::StateChanged(SyncState::FilteringEligible))?;
        let mut items = self.filter_eligible(entries, reporter).await?;
        reporter.emit(SyncEvent::FilteringComplete {
            eligible: items.len(),
        })?;

        reporter.emit(SyncEvent::StateChanged(SyncState::FetchingHistory))?;
        let fallback_count = self.attach_prices(&mut items, reporter).await?;

        reporter.emit(SyncEvent::Status(format!(
            "Updating {}...",
            file_path.display()
        )))?;
        // Last cancellation point, the patch itself runs to completion
        reporter.emit(SyncEvent::StateChanged(SyncState::Patching))?;
        let patch = {
            let path = file_path.to_path_buf();
            let items = items.clone();
            tokio::task::spawn_blocking(move || patch_file(&path, &items)).await??
        };
        reporter.notify(SyncEvent::FilePatched {
            lines_rewritten: patch.lines_rewritten,
        });

        Ok(SyncSummary {
            items,
            patch,
            fallback_count,
        })
    }

    /// Fetch every catalog document and keep the crafting-relevant ones.
    /// Any fetch or parse failure aborts the run.
    async fn filter_eligible(
        &self,
        entries: Vec<CatalogEntry>,
        reporter: &Reporter,
    ) -> Result<Vec<Item>> {
        let catalog = Arc::clone(&self.catalog);
        let filter = Arc::clone(&self.filter);

        let evaluated = self
            .for_each_bounded(
                entries,
                move |entry: CatalogEntry| {
                    let catalog = Arc::clone(&catalog);
                    let filter = Arc::clone(&filter);
                    async move { evaluate_entry(&catalog, &filter, entry).await }
                },
                |evaluated: &EvaluatedEntry| {
                    let mut events = vec![SyncEvent::Status(format!(
                        "Processing file: {}",
                        evaluated.document
                    ))];
                    if let Some(item) = &evaluated.item {
                        log::info!("Found item: {}", item.name_key);
                        events.push(SyncEvent::Status(format!("Found item: {}", item.name_key)));
                    }
                    events
                },
                |processed, total| SyncEvent::FilterProgress { processed, total },
                reporter,
            )
            .await?;

        Ok(evaluated.into_iter().filter_map(|e| e.item).collect())
    }

    /// Fetch history for each item and attach its price. Returns the number of fallbacks.
    async fn attach_prices(&self, items: &mut [Item], reporter: &Reporter) -> Result<usize> {
        let market = Arc::clone(&self.market);
        let retry_delay = self.retry_delay;
        let ids: Vec<ItemId> = items.iter().map(|item| item.item_id.clone()).collect();

        let priced = self
            .for_each_bounded(
                ids,
                move |item_id: ItemId| {
                    let market = Arc::clone(&market);
                    async move {
                        let outcome = market.fetch_history_with_retry(&item_id, retry_delay).await;
                        Ok::<_, SyncError>(PricedId {
                            price: ItemPrice::from_average(aggregate(outcome.transactions())),
                            fallback: outcome.is_fallback(),
                            item_id,
                        })
                    }
                },
                |priced: &PricedId| {
                    log::debug!(
                        "Item {}: average {} (tier {})",
                        priced.item_id,
                        priced.price.average,
                        priced.price.tier
                    );
                    vec![SyncEvent::Status(format!(
                        "Fetching auction history for item ID: {}",
                        priced.item_id
                    ))]
                },
                |processed, total| SyncEvent::HistoryProgress { processed, total },
                reporter,
            )
            .await?;

        let mut fallback_count = 0;
        for (item, priced) in items.iter_mut().zip(priced) {
            item.attach_price(priced.price);
            if priced.fallback {
                fallback_count += 1;
            }
        }
        Ok(fallback_count)
    }

    /// Run `task` for every input with at most `concurrency` in flight.
    ///
    /// Output order matches input order. Events are emitted in completion
    /// order from this single loop, so progress counters only grow and an
    /// empty phase still reports `(0, 0)`. The first error aborts the
    /// remaining tasks.
    async fn for_each_bounded<T, R, F, Fut, D, P>(
        &self,
        inputs: Vec<T>,
        task: F,
        describe: D,
        progress: P,
        reporter: &Reporter,
    ) -> Result<Vec<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<R>> + Send + 'static,
        D: Fn(&R) -> Vec<SyncEvent>,
        P: Fn(usize, usize) -> SyncEvent,
    {
        let total = inputs.len();
        if total == 0 {
            reporter.emit(progress(0, 0))?;
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let work = task(input);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| SyncError::Cancelled)?;
                work.await.map(|result| (index, result))
            });
        }

        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut processed = 0;
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined??;
            processed += 1;
            for event in describe(&result) {
                reporter.emit(event)?;
            }
            reporter.emit(progress(processed, total))?;
            slots[index] = Some(result);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// Catalog document after the eligibility check
struct EvaluatedEntry {
    document: String,
    item: Option<Item>,
}

struct PricedId {
    item_id: ItemId,
    price: ItemPrice,
    fallback: bool,
}

async fn evaluate_entry(
    catalog: &CatalogClient,
    filter: &EligibilityFilter,
    entry: CatalogEntry,
) -> Result<EvaluatedEntry> {
    let doc = catalog.fetch_document(&entry.name).await?;
    let item = if filter.is_eligible(&doc) {
        Some(Item::from_document(&entry.name, &doc)?)
    } else {
        None
    };
    Ok(EvaluatedEntry {
        document: entry.name,
        item,
    })
}

/// The target must exist and be readable and writable before any network work
fn check_target(path: &Path) -> Result<()> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| SyncError::io(path, e))
}
