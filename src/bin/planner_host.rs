//! Command-line host for the habit planner.
//!
//! Opens the SQLite store named by the config, registers the meal domain,
//! and runs one command. Results go to stdout as JSON; all tracing output
//! goes to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habit_planner::domains::meal::Instruction;
use habit_planner::domains::{
    DomainAdapterRegistry, InMemoryRecipeSource, MealAdapter, MealTitleResolver,
    TitleResolverRegistry,
};
use habit_planner::habits::{NewHabit, OccurrenceStatus};
use habit_planner::{LogPublisher, Planner, PlannerConfig, timezone};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Habit planner host.
#[derive(Parser)]
#[command(name = "planner-host", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "HABIT_PLANNER_CONFIG")]
    config: Option<PathBuf>,

    /// JSON file of recipes to load into the meal domain.
    #[arg(long)]
    recipes: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate what is due, then list a user's todos for one date.
    Todos {
        #[arg(long)]
        user: String,
        /// Local date (YYYY-MM-DD). Defaults to today in `--timezone`.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// IANA zone used to work out "today". Defaults to UTC.
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Create a habit from a JSON request file.
    CreateHabit {
        #[arg(long)]
        file: PathBuf,
    },

    /// List a user's habits.
    Habits {
        #[arg(long)]
        user: String,
        /// Include inactive and archived habits.
        #[arg(long)]
        all: bool,
    },

    /// Pause or resume a habit.
    SetActive {
        #[arg(long)]
        habit: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },

    /// Archive a habit.
    Archive {
        #[arg(long)]
        habit: String,
    },

    /// Move an occurrence through its lifecycle.
    SetStatus {
        #[arg(long)]
        occurrence: String,
        #[arg(long)]
        status: String,
    },

    /// Show a habit's audit trail.
    Events {
        #[arg(long)]
        habit: String,
    },

    /// Write the effective configuration to the default config path.
    InitConfig,
}

#[derive(Deserialize)]
struct RecipeSeed {
    id: String,
    name: String,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Serialize)]
struct Created<'a> {
    habit_id: &'a str,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    if let Command::InitConfig = cli.command {
        let path = PlannerConfig::default_config_path();
        config.save_to_file(&path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let recipes = Arc::new(InMemoryRecipeSource::new());
    if let Some(path) = cli.recipes.as_deref() {
        let loaded = load_recipes(&recipes, path)?;
        info!(count = loaded, path = %path.display(), "recipes loaded");
    }
    let adapters = DomainAdapterRegistry::new().with(Arc::new(MealAdapter::new(recipes.clone())));
    let titles = TitleResolverRegistry::new().with(Arc::new(MealTitleResolver::new(recipes)));

    let planner = Planner::open(
        &config,
        Arc::new(adapters),
        Arc::new(titles),
        Arc::new(LogPublisher),
    )
    .context("failed to open planner store")?;

    match cli.command {
        Command::Todos {
            user,
            date,
            timezone: zone,
        } => {
            let date = match date {
                Some(date) => date,
                None => timezone::current_local_date(zone.as_deref().unwrap_or("UTC"))?,
            };
            let todos = planner.list_todos(&user, date)?;
            print_json(&todos)
        }
        Command::CreateHabit { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let request: NewHabit = serde_json::from_str(&raw)
                .with_context(|| format!("invalid habit request in {}", file.display()))?;
            let habit_id = planner.create_habit(request)?;
            print_json(&Created {
                habit_id: &habit_id,
            })
        }
        Command::Habits { user, all } => print_json(&planner.list_habits(&user, all)?),
        Command::SetActive { habit, active } => {
            planner.set_habit_active(&habit, active)?;
            Ok(())
        }
        Command::Archive { habit } => {
            planner.archive_habit(&habit)?;
            Ok(())
        }
        Command::SetStatus { occurrence, status } => {
            let status = parse_status(&status)?;
            planner.set_occurrence_status(&occurrence, status)?;
            Ok(())
        }
        Command::Events { habit } => print_json(&planner.habit_events(&habit)?),
        Command::InitConfig => Ok(()),
    }
}

/// Explicit `--config` must exist; the default path is optional.
fn load_config(path: Option<&Path>) -> anyhow::Result<PlannerConfig> {
    match path {
        Some(path) => PlannerConfig::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => {
            let default_path = PlannerConfig::default_config_path();
            if default_path.is_file() {
                Ok(PlannerConfig::from_file(&default_path)?)
            } else {
                Ok(PlannerConfig::default())
            }
        }
    }
}

fn load_recipes(source: &InMemoryRecipeSource, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let seeds: Vec<RecipeSeed> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid recipes in {}", path.display()))?;
    let count = seeds.len();
    for seed in seeds {
        source.publish(&seed.id, &seed.name, seed.instructions)?;
    }
    Ok(count)
}

fn parse_status(raw: &str) -> anyhow::Result<OccurrenceStatus> {
    match raw {
        "planned" => Ok(OccurrenceStatus::Planned),
        "active" => Ok(OccurrenceStatus::Active),
        "completed" => Ok(OccurrenceStatus::Completed),
        "cancelled" => Ok(OccurrenceStatus::Cancelled),
        other => anyhow::bail!("unknown occurrence status {other:?}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
