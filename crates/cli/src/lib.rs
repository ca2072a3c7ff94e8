use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pocket_protocol::{Dataset, HEALTH_PATH};
use pocket_snapshot::{SnapshotError, SnapshotResolver};
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod http_api;
mod server;
mod server_security;
mod shell;
mod submit;

pub use server::build_router;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "pocket")]
#[command(about = "Purple Pocket route and solicitation listings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the snapshot API and data files over HTTP
    ServeHttp(ServeArgs),

    /// Print the current snapshot file name of a dataset
    Latest(LatestArgs),

    /// Fetch, filter, sort and page a dataset in the terminal
    View(ViewArgs),

    /// Bid on a route
    Bid(BidArgs),

    /// Apply to a solicitation
    Apply(ApplyArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address [default: 127.0.0.1:$PORT, PORT defaults to 5000]
    #[arg(long)]
    bind: Option<String>,

    /// Allow binding to non-loopback addresses
    #[arg(long)]
    public: bool,

    /// Snapshot directory (env: POCKET_DATA_DIR) [default: data]
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LatestTarget {
    Routes,
    Solicitations,
    /// Any CSV in the directory
    Any,
}

#[derive(Args)]
struct LatestArgs {
    #[arg(value_enum)]
    target: LatestTarget,

    /// Snapshot directory (env: POCKET_DATA_DIR) [default: data]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print the full path instead of the file name
    #[arg(long)]
    path: bool,
}

#[derive(Args)]
pub(crate) struct ViewArgs {
    /// routes|solicitations
    dataset: Dataset,

    /// Listings server to read from (env: POCKET_BASE_URL)
    #[arg(long, conflicts_with = "data_dir")]
    base_url: Option<String>,

    /// Read snapshots straight from a directory (env: POCKET_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Case-insensitive free-text search
    #[arg(long)]
    search: Option<String>,

    /// Routes: exact state code
    #[arg(long)]
    state: Option<String>,

    /// Routes: exact route type
    #[arg(long = "type")]
    route_type: Option<String>,

    /// Solicitations: open|closing|review
    #[arg(long)]
    status: Option<String>,

    /// Sort field, optionally suffixed with -asc/-desc
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// 1-based page number
    #[arg(long, default_value = "1")]
    page: NonZeroUsize,

    #[arg(long, default_value = "10")]
    page_size: NonZeroUsize,

    /// Print the page as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub(crate) struct ContactArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,

    /// Years of experience
    #[arg(long, default_value_t = 0)]
    experience: u32,
}

#[derive(Args)]
pub(crate) struct BidArgs {
    /// Route id to bid on
    #[arg(long)]
    route: String,

    #[command(flatten)]
    contact: ContactArgs,

    /// Bid amount in dollars
    #[arg(long)]
    amount: f64,

    #[arg(long)]
    message: Option<String>,

    /// Simulated processing time
    #[arg(long, default_value_t = 1500, hide = true)]
    delay_ms: u64,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    /// Solicitation id to apply to
    #[arg(long)]
    solicitation: String,

    #[command(flatten)]
    contact: ContactArgs,

    /// Driver's license number
    #[arg(long)]
    license: String,

    /// Vehicle type
    #[arg(long)]
    vehicle: String,

    /// Agree to the terms and conditions
    #[arg(long)]
    agree_terms: bool,

    #[arg(long, default_value_t = 1500, hide = true)]
    delay_ms: u64,

    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<ExitCode> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::View(args) => args.json,
        Commands::Bid(args) => args.json,
        Commands::Apply(args) => args.json,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::ServeHttp(args) => serve_http(args).await.map(|()| ExitCode::SUCCESS),
        Commands::Latest(args) => run_latest(args).await,
        Commands::View(args) => {
            let source = match config::resolve_base_url(args.base_url.clone()) {
                Some(base_url) if args.data_dir.is_none() => shell::Source::Remote(base_url),
                _ => shell::Source::Local(config::resolve_data_dir(args.data_dir.clone())),
            };
            shell::run_view(args, source).await
        }
        Commands::Bid(args) => submit::run_bid(args).await,
        Commands::Apply(args) => submit::run_apply(args).await,
    }
}

async fn run_latest(args: LatestArgs) -> Result<ExitCode> {
    let resolver = SnapshotResolver::new(config::resolve_data_dir(args.data_dir));
    let target = args.target;
    let resolved = tokio::task::spawn_blocking(move || match target {
        LatestTarget::Routes => resolver.latest(Dataset::Routes),
        LatestTarget::Solicitations => resolver.latest(Dataset::Solicitations),
        LatestTarget::Any => resolver.latest_any(),
    })
    .await
    .context("Snapshot scan task failed")?;

    match resolved {
        Ok(file) if args.path => print_stdout(&file.path.display().to_string())?,
        Ok(file) => print_stdout(&file.name)?,
        Err(err @ SnapshotError::NotFound { .. }) => {
            eprintln!("{err}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    }
    Ok(ExitCode::SUCCESS)
}

async fn serve_http(args: ServeArgs) -> Result<()> {
    let bind = config::resolve_bind(args.bind)?;
    let addrs = server_security::resolve_guarded_bind_addrs(&bind, args.public).await?;
    let data_dir = config::resolve_data_dir(args.data_dir);
    if !data_dir.is_dir() {
        log::warn!(
            "Data directory {} does not exist yet; snapshot requests will fail until it does",
            data_dir.display()
        );
    }

    let app = build_router(data_dir.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    log::info!("Listening on {local_addr}, serving {}", data_dir.display());
    print_stdout(&format!("Serving listings API: {base_url}/api"))?;
    print_stdout(&format!("Health endpoint: {base_url}{HEALTH_PATH}"))?;
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!(
        "Try: curl {base_url}{}",
        Dataset::Routes.latest_path()
    ))?;
    axum::serve(listener, app).await?;
    Ok(())
}
