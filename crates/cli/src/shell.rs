use crate::{print_stdout, ViewArgs};
use anyhow::{Context as AnyhowContext, Result};
use pocket_ingest::{parse_csv, DatasetLoader, LoadState, ParseOptions};
use pocket_model::{normalize_rows, Normalize, RouteRecord, SolicitationRecord, SolicitationStatus};
use pocket_protocol::{serialize_json, Dataset};
use pocket_snapshot::SnapshotResolver;
use pocket_view::{
    clamp_page, compute_view, RouteFilters, RouteSortField, SolicitationFilters,
    SolicitationSortField, SortDirection, SortSpec, View, ViewQuery, Viewable,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

const MAX_CELL_WIDTH: usize = 40;

/// Where `pocket view` reads snapshots from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Source {
    /// A listings server: `/api/latest-*-csv`, then `/data/<file>`.
    Remote(String),
    /// A data directory resolved in-process.
    Local(PathBuf),
}

impl Source {
    fn retry_hint(&self, dataset: Dataset) -> String {
        match self {
            Self::Remote(base) => format!(
                "Retry: check that the server at {base} is running, then run the command again."
            ),
            Self::Local(dir) => format!(
                "Retry: make sure {} holds a {}*.csv snapshot, then run the command again.",
                dir.display(),
                dataset.prefix()
            ),
        }
    }
}

/// Terminal rendering of one record type.
trait Tabular {
    const NOUN: &'static str;

    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl Tabular for RouteRecord {
    const NOUN: &'static str = "routes";

    fn headers() -> &'static [&'static str] {
        &["ID", "Location", "State", "ZIP", "Type", "Length (mi)", "Pay Rate"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.location.clone(),
            self.state.clone(),
            self.zip.clone(),
            self.route_type.clone(),
            format!("{:.1}", self.length),
            self.pay_rate.clone(),
        ]
    }
}

impl Tabular for SolicitationRecord {
    const NOUN: &'static str = "solicitations";

    fn headers() -> &'static [&'static str] {
        &[
            "ID",
            "Title",
            "Status",
            "Posted",
            "Closing",
            "Min Exp (yrs)",
            "Duration (mo)",
            "Budget",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.status.to_string(),
            self.posted_date.clone(),
            self.closing_date.clone(),
            self.experience.to_string(),
            self.duration.to_string(),
            self.budget.clone(),
        ]
    }
}

pub(crate) async fn run_view(args: ViewArgs, source: Source) -> Result<ExitCode> {
    match args.dataset {
        Dataset::Routes => {
            if args.status.is_some() {
                log::warn!("--status applies to solicitations only; ignoring it");
            }
            let query = ViewQuery {
                search: args.search.clone().unwrap_or_default(),
                filters: RouteFilters {
                    state: args.state.clone(),
                    route_type: args.route_type.clone(),
                },
                sort: sort_spec::<RouteSortField>(args.sort.as_deref(), args.desc)?,
                page: args.page,
                page_size: args.page_size,
            };
            run_listing::<RouteRecord>(&args, &source, query).await
        }
        Dataset::Solicitations => {
            if args.state.is_some() || args.route_type.is_some() {
                log::warn!("--state/--type apply to routes only; ignoring them");
            }
            let status = args
                .status
                .as_deref()
                .map(|raw| {
                    SolicitationStatus::parse(raw).with_context(|| {
                        format!("unknown status '{raw}' (expected open|closing|review)")
                    })
                })
                .transpose()?;
            let query = ViewQuery {
                search: args.search.clone().unwrap_or_default(),
                filters: SolicitationFilters { status },
                sort: sort_spec::<SolicitationSortField>(args.sort.as_deref(), args.desc)?,
                page: args.page,
                page_size: args.page_size,
            };
            run_listing::<SolicitationRecord>(&args, &source, query).await
        }
    }
}

/// `--sort length` plus `--desc`; a `-desc` suffix on the field works too.
fn sort_spec<S>(raw: Option<&str>, desc: bool) -> Result<Option<SortSpec<S>>>
where
    SortSpec<S>: FromStr,
    <SortSpec<S> as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(raw) = raw else {
        if desc {
            log::warn!("--desc has no effect without --sort");
        }
        return Ok(None);
    };
    let mut spec: SortSpec<S> = raw.parse().context("invalid --sort")?;
    if desc {
        spec.direction = SortDirection::Descending;
    }
    Ok(Some(spec))
}

async fn run_listing<T>(
    args: &ViewArgs,
    source: &Source,
    query: ViewQuery<T::Filters, T::SortField>,
) -> Result<ExitCode>
where
    T: Viewable + Tabular + Normalize + Serialize + Clone + Send + Sync + 'static,
    T::Filters: Clone,
{
    let loaded = match load_records::<T>(source, args.dataset).await {
        Ok(records) => records,
        Err(err) => {
            render_failure(args, source, &err)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let records: &[T] = &loaded;
    let mut view = compute_view(records, &query);
    if view.page_items.is_empty() && view.total_pages > 0 {
        let page = clamp_page(query.page.get(), view.total_pages);
        log::info!(
            "Page {} is past the last page; showing page {page}",
            query.page
        );
        view = compute_view(records, &query.clone().with_page(page));
    }

    if args.json {
        print_stdout(&serialize_json(&view)?)?;
    } else {
        print_stdout(&render_table(&view))?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn load_records<T>(source: &Source, dataset: Dataset) -> Result<Arc<[T]>>
where
    T: Normalize + Clone + Send + Sync + 'static,
{
    match source {
        Source::Remote(base_url) => {
            let client = reqwest::Client::builder()
                .build()
                .context("Failed to build HTTP client")?;
            let loader = DatasetLoader::<T>::new(client);
            loader.load_latest(base_url, dataset).await;
            match loader.current() {
                LoadState::Ready {
                    source, records, ..
                } => {
                    log::info!("Loaded {} {dataset} from {source}", records.len());
                    Ok(records)
                }
                LoadState::Failed { message, .. } => Err(anyhow::anyhow!(message)),
                LoadState::Idle | LoadState::Loading { .. } => {
                    anyhow::bail!("{dataset} load did not finish")
                }
            }
        }
        Source::Local(dir) => {
            let resolver = SnapshotResolver::new(dir);
            let file = tokio::task::spawn_blocking(move || resolver.latest(dataset))
                .await
                .context("Snapshot scan task failed")??;
            let text = tokio::fs::read_to_string(&file.path)
                .await
                .with_context(|| format!("Failed to read {}", file.path.display()))?;
            let parsed = parse_csv(&text, &ParseOptions::default())?;
            let records: Vec<T> = normalize_rows(&parsed.rows);
            log::info!(
                "Loaded {} {dataset} from {}",
                records.len(),
                file.path.display()
            );
            Ok(records.into())
        }
    }
}

fn render_failure(args: &ViewArgs, source: &Source, err: &anyhow::Error) -> Result<()> {
    let hint = source.retry_hint(args.dataset);
    if args.json {
        let body = serde_json::json!({
            "state": "failed",
            "dataset": args.dataset,
            "error": format!("{err:#}"),
            "hint": hint,
        });
        return print_stdout(&serialize_json(&body)?);
    }
    print_stdout(&format!(
        "{} data failed to load.\n  {err:#}\n{hint}",
        capitalize(args.dataset.slug())
    ))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn truncate(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell.to_string();
    }
    let kept: String = cell.chars().take(MAX_CELL_WIDTH - 3).collect();
    format!("{kept}...")
}

fn render_table<T: Tabular>(view: &View<T>) -> String {
    if view.total_count == 0 {
        return format!("No {} match the current filters.", T::NOUN);
    }

    let headers = T::headers();
    let rows: Vec<Vec<String>> = view
        .page_items
        .iter()
        .map(|item| item.cells().iter().map(|cell| truncate(cell)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header_cells: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut lines = vec![format_row(header_cells.as_slice()), format_row(rule.as_slice())];
    lines.extend(rows.iter().map(|row| format_row(row.as_slice())));
    lines.push(String::new());
    lines.push(format!(
        "Page {} of {} ({} {})",
        view.page, view.total_pages, view.total_count, T::NOUN
    ));
    lines.join("\n")
}
