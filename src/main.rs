// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use player_compare::{
    build_series, spawn_fetch, AppConfig, ChartMode, CommitOutcome, ConfigOverrides,
    CsvStatSource, Entity, Period, PlayerId, SelectionState, Slot, StatFetchCoordinator,
    StatSource, Winner,
};
use serde_json::json;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Side-by-side player stat comparison", long_about = None)]
struct Cli {
    /// Optional JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding stats.csv and news.csv
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Chart geometry: radial or cartesian
    #[arg(long)]
    chart_mode: Option<ChartMode>,

    /// Plotted size multiplier
    #[arg(long)]
    size_factor: Option<f64>,

    /// Log file used in interactive mode
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a comparison without the interactive UI
    Compare {
        /// Left player: numeric id or name (at least 3 characters)
        left: String,
        /// Right player: numeric id or name
        right: String,
        #[arg(long, default_value = "")]
        left_season: String,
        #[arg(long, default_value = "")]
        right_season: String,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let _guard = runtime.enter();

    match cli.command {
        Some(Command::Compare {
            left,
            right,
            left_season,
            right_season,
            json,
        }) => {
            init_logging(None)?;
            let source = Arc::new(CsvStatSource::from_dir(&config.data_dir)?);
            let request = CompareArgs {
                left,
                right,
                left_season: Period::parse(&left_season),
                right_season: Period::parse(&right_season),
                json,
            };
            runtime.block_on(run_compare(source, &config, request))
        }
        None => {
            init_logging(Some(&config.log_file))?;
            let source = Arc::new(CsvStatSource::from_dir(&config.data_dir)?);
            run_ui_mode(source, &config)
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    config.apply_overrides(ConfigOverrides {
        data_dir: cli.data_dir.clone(),
        chart_mode: cli.chart_mode,
        size_factor: cli.size_factor,
        log_file: cli.log_file.clone(),
    })?;
    Ok(config)
}

/// stderr for one-shot commands, a file for the TUI
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).compact();

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {:?}", path))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

struct CompareArgs {
    left: String,
    right: String,
    left_season: Period,
    right_season: Period,
    json: bool,
}

/// Numeric input is an id; anything else goes through search, first hit wins
async fn resolve_player(source: &CsvStatSource, query: &str) -> Result<Entity> {
    if let Ok(id) = query.trim().parse::<u32>() {
        let entity = source
            .entity(PlayerId(id))
            .ok_or_else(|| anyhow!("No player with id {}", id))?;
        info!(player = id, name = %entity.display_name, "resolved by id");
        return Ok(entity);
    }

    let hits = source.search(query).await?;
    hits.into_iter()
        .next()
        .ok_or_else(|| anyhow!("No player matches '{}' (queries need at least 3 characters)", query))
}

async fn run_compare(source: Arc<CsvStatSource>, config: &AppConfig, args: CompareArgs) -> Result<()> {
    let left = resolve_player(&source, &args.left).await?;
    let right = resolve_player(&source, &args.right).await?;

    // Same path as the UI: selection → coordinator → committed records
    let mut selection = SelectionState::new();
    let empty = selection.snapshot();
    selection.set_entity(Slot::Left, Some(left.clone()));
    selection.set_period(Slot::Left, args.left_season);
    selection.set_entity(Slot::Right, Some(right.clone()));
    selection.set_period(Slot::Right, args.right_season);
    let snapshot = selection.snapshot();

    let mut coordinator = StatFetchCoordinator::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let requests = coordinator.sync(&empty, &snapshot);
    let expected = requests.len();
    for request in requests {
        spawn_fetch(source.clone(), request, tx.clone());
    }
    drop(tx);

    for _ in 0..expected {
        let Some(done) = rx.recv().await else { break };
        let slot = done.slot;
        if let CommitOutcome::Failed(err) = coordinator.commit(done) {
            bail!("{}: {}", slot.name(), err);
        }
    }

    let rows = coordinator.comparison();
    let left_series = build_series(left.display_name.clone(), coordinator.record(Slot::Left));
    let right_series = build_series(right.display_name.clone(), coordinator.record(Slot::Right));
    let season = |slot| {
        coordinator
            .record(slot)
            .and_then(|r| r.period.clone())
            .unwrap_or_else(|| "-".to_string())
    };

    if args.json {
        let geometry = config.geometry();
        let stats = |slot| {
            coordinator
                .record(slot)
                .map(|r| r.to_json())
                .unwrap_or(serde_json::Value::Null)
        };
        let output = json!({
            "left": { "player": left, "season": season(Slot::Left), "stats": stats(Slot::Left) },
            "right": { "player": right, "season": season(Slot::Right), "stats": stats(Slot::Right) },
            "rows": rows,
            "chart": {
                "geometry": geometry,
                "series": [left_series, right_series],
                "points": [geometry.project(&left_series), geometry.project(&right_series)],
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{:>24}  {:^6}  {:<24}",
        format!("{} ({})", left.display_name, season(Slot::Left)),
        "",
        format!("{} ({})", right.display_name, season(Slot::Right))
    );
    println!("{}", "━".repeat(58));
    for (i, row) in rows.iter().enumerate() {
        let (l_mark, r_mark) = match row.winner {
            Winner::Left => ("◀", " "),
            Winner::Right => (" ", "▶"),
            Winner::Tie => ("=", "="),
            Winner::Unavailable => (" ", " "),
        };
        println!(
            "{:>22} {}  {:^6}  {} {:<22}   chart: {} | {}",
            row.display_left(),
            l_mark,
            row.label(),
            r_mark,
            row.display_right(),
            left_series.tooltip(i).unwrap_or_default(),
            right_series.tooltip(i).unwrap_or_default(),
        );
    }

    let (l, r) = player_compare::comparison::score(&rows);
    println!("{}", "━".repeat(58));
    println!("Categories won: {} {} - {} {}", left.display_name, l, r, right.display_name);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(source: Arc<CsvStatSource>, config: &AppConfig) -> Result<()> {
    info!(data_dir = ?config.data_dir, mode = config.chart_mode.name(), "starting UI");

    let mut app = ui::App::new(source, config);
    ui::run_ui(&mut app)?;

    println!("Bye!");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_source: Arc<CsvStatSource>, _config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: player-compare compare <left> <right>");
    std::process::exit(1);
}
