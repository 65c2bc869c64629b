//! Later — offline-first daily task planner.
//!
//! Drives the task store in local-only mode against the file-backed cache
//! (the signed-out experience; cloud sync engages when an identity adapter
//! signs a user in). Configuration via CLI flags, environment variables,
//! or config file (`~/.config/later/config.toml`).
//!
//! ```bash
//! later add "Buy milk" --date 2024-03-01 --time 09:00
//! later list --date 2024-03-01
//! later search milk
//! later days
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;

use later::alert::AlertSink;
use later::config::{AppConfig, CliArgs};
use later::local::file::JsonFileStore;
use later::remote::memory::MemoryRemoteStore;
use later::store::TaskStore;
use later_model::{DayKey, Task, TaskDraft, TaskId};

#[derive(Parser, Debug)]
#[command(version, about = "Offline-first daily task planner")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task to a day.
    Add {
        /// Task title.
        title: String,
        /// Day (`yyyy-MM-dd`), default today.
        #[arg(long)]
        date: Option<String>,
        /// Wall-clock time (`HH:MM`).
        #[arg(long)]
        time: Option<String>,
        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
    },
    /// List a day's tasks.
    List {
        /// Day (`yyyy-MM-dd`), default today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Toggle a task's completion flag.
    Toggle {
        /// Task id as shown by `list`.
        id: TaskId,
        /// Day (`yyyy-MM-dd`), default today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a task.
    Delete {
        /// Task id as shown by `list`.
        id: TaskId,
        /// Day (`yyyy-MM-dd`), default today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Search tasks by title or description.
    Search {
        /// Substring to match, case-insensitive.
        term: String,
    },
    /// Show which days have tasks.
    Days,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match AppConfig::load(&cli.args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            AppConfig::default()
        }
    };

    // Logging goes to a file so command output stays clean.
    let _log_guard = init_logging(&cli.args.log_level, cli.args.log_file.as_deref());
    tracing::info!("later starting");

    let (alerts, _alert_rx) = AlertSink::channel(config.alert_buffer);
    let store = Arc::new(TaskStore::new(
        JsonFileStore::new(&config.cache_dir),
        MemoryRemoteStore::with_channel_capacity(config.subscription_buffer),
        alerts,
    ));

    // Nobody is signed in on the CLI path: this loads the local cache.
    store.refresh().await;

    match run_command(&store, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Executes one subcommand against the store.
async fn run_command(
    store: &Arc<TaskStore<JsonFileStore, MemoryRemoteStore>>,
    command: Command,
) -> Result<(), String> {
    match command {
        Command::Add {
            title,
            date,
            time,
            description,
        } => {
            let day = parse_day(date.as_deref())?;
            let mut draft = TaskDraft::new(title).map_err(|e| e.to_string())?;
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            if let Some(time) = time {
                let time = chrono::NaiveTime::parse_from_str(&time, "%H:%M")
                    .map_err(|_| format!("invalid time {time:?} (expected HH:MM)"))?;
                draft = draft.with_time(time);
            }
            store.add_task(day, draft);
            store.write_cache().await;
            println!("added to {day}");
        }
        Command::List { date } => {
            let day = parse_day(date.as_deref())?;
            let tasks = store.tasks_for_day(day);
            if tasks.is_empty() {
                println!("no tasks for {day}");
            } else {
                for task in &tasks {
                    println!("{}", format_task(task));
                }
            }
        }
        Command::Toggle { id, date } => {
            let day = parse_day(date.as_deref())?;
            store.toggle_task(day, &id);
            store.write_cache().await;
            match store.tasks_for_day(day).iter().find(|t| t.id == id) {
                Some(task) => println!("{}", format_task(task)),
                None => return Err(format!("no task {id} on {day}")),
            }
        }
        Command::Delete { id, date } => {
            let day = parse_day(date.as_deref())?;
            let before = store.tasks_for_day(day).len();
            store.delete_task(day, &id);
            store.write_cache().await;
            if store.tasks_for_day(day).len() == before {
                return Err(format!("no task {id} on {day}"));
            }
            println!("deleted from {day}");
        }
        Command::Search { term } => {
            let hits = store.search(&term);
            if hits.is_empty() {
                println!("no matches");
            } else {
                for hit in &hits {
                    println!("{}  {}", hit.day, format_task(&hit.task));
                }
            }
        }
        Command::Days => {
            let mut days: Vec<_> = store.marked_days().into_iter().collect();
            days.sort_by_key(|(day, _)| *day);
            if days.is_empty() {
                println!("no tasks yet");
            }
            for (day, marker) in days {
                println!(
                    "{day}  {}/{} done",
                    marker.completed_count, marker.task_count
                );
            }
        }
    }
    Ok(())
}

/// Parses an optional `yyyy-MM-dd` argument, defaulting to today.
fn parse_day(date: Option<&str>) -> Result<DayKey, String> {
    date.map_or_else(
        || Ok(DayKey::today()),
        |d| DayKey::parse(d).map_err(|e| e.to_string()),
    )
}

/// One-line human-readable rendering of a task.
fn format_task(task: &Task) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let time = task
        .time
        .map(|t| format!("{} ", t.format("%H:%M")))
        .unwrap_or_default();
    let description = if task.description.is_empty() {
        String::new()
    } else {
        format!(" — {}", task.description)
    };
    format!("{check} {time}{}{description}  ({})", task.title, task.id)
}

/// Initialize file-based logging.
///
/// Logs go to a file, never stdout — the terminal belongs to command
/// output. Returns a [`WorkerGuard`] that must be held until shutdown to
/// ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("later.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
