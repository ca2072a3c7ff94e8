use crate::error::Result;
use crate::fetch::{fetch_and_parse, fetch_latest, Snapshot};
use crate::parse::ParseOptions;
use pocket_model::{normalize_rows, Normalize};
use pocket_protocol::Dataset;
use reqwest::Client;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub enum LoadState<T> {
    Idle,
    Loading {
        generation: u64,
    },
    Ready {
        generation: u64,
        source: String,
        records: Arc<[T]>,
    },
    Failed {
        generation: u64,
        message: String,
    },
}

impl<T> LoadState<T> {
    #[must_use]
    pub fn records(&self) -> Option<&Arc<[T]>> {
        match self {
            Self::Ready { records, .. } => Some(records),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The result was published.
    Applied,
    /// A newer load started before this one finished; its result was dropped.
    Superseded,
}

/// Loads one dataset for a single consumer.
///
/// Each call to `load*` takes a new generation. Only the newest generation
/// may publish, so a slow earlier fetch can never overwrite a later one.
pub struct DatasetLoader<T> {
    client: Client,
    options: ParseOptions,
    generation: AtomicU64,
    state: watch::Sender<LoadState<T>>,
}

impl<T> DatasetLoader<T>
where
    T: Normalize + Clone,
{
    pub fn new(client: Client) -> Self {
        Self::with_options(client, ParseOptions::default())
    }

    pub fn with_options(client: Client, options: ParseOptions) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            client,
            options,
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    /// Fetches and parses a CSV by URL.
    pub async fn load(&self, url: &str) -> LoadOutcome {
        let source = url.to_string();
        self.load_with(async {
            let rows = fetch_and_parse(&self.client, url, &self.options).await?;
            Ok(Snapshot { source, rows })
        })
        .await
    }

    /// Resolves the dataset's current snapshot on `base_url`, then loads it.
    pub async fn load_latest(&self, base_url: &str, dataset: Dataset) -> LoadOutcome {
        self.load_with(fetch_latest(&self.client, base_url, dataset, &self.options))
            .await
    }

    /// Runs an arbitrary fetch cycle under the last-request-wins rule.
    pub async fn load_with<F>(&self, fetch: F) -> LoadOutcome
    where
        F: Future<Output = Result<Snapshot>>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(generation, LoadState::Loading { generation });

        let next = match fetch.await {
            Ok(snapshot) => {
                let records: Vec<T> = normalize_rows(&snapshot.rows.rows);
                log::debug!(
                    "Loaded {} records from {} (generation {generation})",
                    records.len(),
                    snapshot.source
                );
                LoadState::Ready {
                    generation,
                    source: snapshot.source,
                    records: records.into(),
                }
            }
            Err(err) => {
                log::warn!("Data failed to load: {err}");
                LoadState::Failed {
                    generation,
                    message: err.to_string(),
                }
            }
        };

        if self.publish(generation, next) {
            LoadOutcome::Applied
        } else {
            log::debug!("Dropping superseded load (generation {generation})");
            LoadOutcome::Superseded
        }
    }

    fn publish(&self, generation: u64, next: LoadState<T>) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::parse::parse_csv;
    use pocket_model::RouteRecord;
    use std::time::Duration;

    fn snapshot(text: &str) -> Result<Snapshot> {
        Ok(Snapshot {
            source: "memory".to_string(),
            rows: parse_csv(text, &ParseOptions::default())?,
        })
    }

    fn ids(state: &LoadState<RouteRecord>) -> Vec<String> {
        state
            .records()
            .map(|records| records.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn slow_earlier_load_does_not_overwrite_newer_one() {
        let loader: DatasetLoader<RouteRecord> = DatasetLoader::new(Client::new());

        let slow = loader.load_with(async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            snapshot("id\nOLD\n")
        });
        let fast = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load_with(async { snapshot("id\nNEW\n") }).await
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow, LoadOutcome::Superseded);
        assert_eq!(fast, LoadOutcome::Applied);
        assert_eq!(ids(&loader.current()), vec!["NEW"]);
    }

    #[tokio::test]
    async fn failure_is_published_as_terminal_state() {
        let loader: DatasetLoader<RouteRecord> = DatasetLoader::new(Client::new());
        let outcome = loader
            .load_with(async {
                Err(IngestError::Parse {
                    message: "bad quote".to_string(),
                })
            })
            .await;

        assert_eq!(outcome, LoadOutcome::Applied);
        match loader.current() {
            LoadState::Failed { message, .. } => assert!(message.contains("bad quote")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_successful_cycle_replaces_records() {
        let loader: DatasetLoader<RouteRecord> = DatasetLoader::new(Client::new());
        let mut updates = loader.subscribe();

        loader.load_with(async { snapshot("id\nA\nB\n") }).await;
        assert_eq!(ids(&loader.current()), vec!["A", "B"]);
        loader.load_with(async { snapshot("id\nC\n") }).await;
        assert_eq!(ids(&loader.current()), vec!["C"]);

        assert!(updates.has_changed().unwrap());
        assert_eq!(ids(&updates.borrow_and_update()), vec!["C"]);
    }
}
