//! taskgate - Task Gate State Engine
//!
//! Command-line front end: task activation, gate check-off, listings, and
//! the hook entry point the host runtime calls before agent actions.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod hooks;

use crate::hooks::HookType;
use taskgate::gates::{parse_gates, summarize};
use taskgate::policy::ActionKind;
use taskgate::root::{resolve_root, ProjectRoot, CLAUDE_MD_FILE, MIND_MAP_FILE, TASKS_DIR};
use taskgate::session::{ActiveTask, SessionStore};
use taskgate::state::TaskStateMachine;
use taskgate::status::StatusFormatter;
use taskgate::task::template::{claude_md_stub, load_pattern_template, mind_map_stub, title_case};
use taskgate::task::{TaskId, TaskStore, TaskType};
use taskgate::{GateConfig, TaskGateError};

#[derive(Parser)]
#[command(name = "taskgate")]
#[command(version = "0.1.0")]
#[command(about = "Checklist-driven task gates for coding agents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory to resolve the project from (defaults to current directory)
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    dir: PathBuf,

    /// Session id; each session has its own active task
    #[arg(long, global = true, env = "TASKGATE_SESSION_ID")]
    session: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the project root enclosing the directory
    Root,

    /// Parse a task document and show its gates
    Gates {
        /// Task document to parse
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Activate task N, or `done` to deactivate the current task
    Work {
        /// Task number or `done`
        target: String,
    },

    /// Check off the current gate of the active task
    Check,

    /// Show the active task and the head gate of every open task
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks with status, progress and intent
    #[command(alias = "ls")]
    List {
        /// Hide tasks whose status is done
        #[arg(long)]
        pending: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new task document
    New {
        /// Task type (selects the playbook pattern)
        #[arg(value_enum)]
        task_type: TaskType,

        /// Task name
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Initialize a project: .agent/tasks/, MIND_MAP.md, CLAUDE.md
    Init {
        /// Target directory (defaults to --dir)
        target: Option<PathBuf>,
    },

    /// Enforcement hooks called by the host runtime
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },
}

#[derive(Subcommand)]
enum HookAction {
    /// Run a hook for a host event
    Run {
        /// Hook type to run
        #[arg(value_enum)]
        hook_type: HookType,

        /// Host payload (JSON); read from stdin when omitted
        input: Option<String>,
    },

    /// Evaluate an action kind directly
    Decide {
        /// Action to evaluate
        #[arg(value_enum)]
        action: ActionKind,

        /// Host payload (JSON); read from stdin when omitted
        input: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the host on the hook path
    let default_filter = if cli.verbose {
        "taskgate=debug"
    } else {
        "taskgate=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        let gate_error = e.downcast_ref::<TaskGateError>();
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if gate_error.is_some_and(TaskGateError::is_actionable) {
            eprintln!("See where work stands with: taskgate status");
        }
        std::process::exit(gate_error.map_or(1, TaskGateError::exit_code));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let start_dir = cli.dir.canonicalize().unwrap_or(cli.dir.clone());
    let session = cli.session.as_deref();

    match cli.command {
        Commands::Root => {
            let root = require_root(&start_dir)?;
            println!("{}", root);
        }

        Commands::Gates { file, json } => {
            let file = start_dir.join(file);
            let text = std::fs::read_to_string(&file).unwrap_or_else(|e| {
                debug!("Cannot read {}: {}", file.display(), e);
                String::new()
            });
            let gates = parse_gates(&text);
            let summary = summarize(&gates);

            if json {
                let out = serde_json::json!({ "gates": gates, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for gate in &gates {
                    let mark = if gate.checked { "x".green() } else { " ".normal() };
                    println!("{:>5}  [{}] {}", gate.line_number, mark, gate.raw_text);
                }
                match &summary.current_gate {
                    Some(gate) => println!(
                        "\n{} {} | current gate (line {}): {}",
                        "Progress:".cyan().bold(),
                        summary.progress(),
                        gate.line_number,
                        gate.raw_text
                    ),
                    None => println!(
                        "\n{} {} | all gates checked",
                        "Progress:".cyan().bold(),
                        summary.progress()
                    ),
                }
            }
        }

        Commands::Work { target } if target == "done" => {
            let root = require_root(&start_dir)?;
            let sessions = SessionStore::new(&root, session);
            let mut machine =
                TaskStateMachine::resume(Some(root.clone()), sessions.load().map(|a| a.task_id));
            let previous = machine.deactivate();
            sessions.clear()?;

            match previous {
                Some(id) => {
                    let store = TaskStore::new(&root);
                    match store.set_status(id, "done") {
                        Ok(true) => {}
                        Ok(false) => println!(
                            "{} Task {} has no ## Status section to update",
                            "Warning:".yellow(),
                            id
                        ),
                        Err(e) => println!("{} {}", "Warning:".yellow(), e),
                    }
                    println!("{} Task {} done.", "OK".green().bold(), id);
                }
                None => println!("No active task."),
            }
            println!("Code edits blocked until: taskgate work <N>");
        }

        Commands::Work { target } => {
            let id: TaskId = target.parse()?;
            let root = require_root(&start_dir)?;
            let config = GateConfig::load(root.path())?;
            let sessions = SessionStore::new(&root, session);
            let mut machine =
                TaskStateMachine::resume(Some(root.clone()), sessions.load().map(|a| a.task_id));

            let summary = machine.activate(id)?;
            sessions.save(&ActiveTask::new(id))?;
            let pruned = sessions.prune_stale(config.stale_session_age());
            if pruned > 0 {
                debug!("Pruned {} stale session files", pruned);
            }

            let doc = TaskStore::new(&root).get(id)?;
            if doc.is_done() {
                println!(
                    "{} Task {} is marked done. Set its Status to pending to reopen.",
                    "Warning:".yellow(),
                    id
                );
            }

            let formatter = StatusFormatter::new(config.status_text_width);
            println!(
                "{} Task {} active ({})",
                "OK".green().bold(),
                id,
                summary.progress()
            );
            println!("{}", formatter.status_line(&machine.engine_state()));
            println!();
            println!("=== {} ===", doc.relative_path(root.path()).display());
            println!("{}", doc.text.trim_end());
        }

        Commands::Check => {
            let root = require_root(&start_dir)?;
            let config = GateConfig::load(root.path())?;
            let id = SessionStore::new(&root, session)
                .load()
                .map(|a| a.task_id)
                .ok_or(TaskGateError::NoActiveTask)?;

            let result = TaskStore::new(&root).check_current_gate(id, config.upcoming_gates)?;
            let formatter = StatusFormatter::new(config.status_text_width);

            println!(
                "{} Checked: {}",
                "OK".green().bold(),
                formatter.gate_text(&result.checked)
            );
            if result.summary.is_complete() {
                println!("All gates checked. Finish with: taskgate work done");
            } else {
                println!("Next:");
                println!("{}", formatter.gate_list(&result.upcoming));
            }

            let machine = TaskStateMachine::resume(Some(root), Some(id));
            println!("{}", formatter.status_line(&machine.engine_state()));
        }

        Commands::Status { json } => {
            let Some(root) = resolve_root(&start_dir) else {
                let formatter = StatusFormatter::default();
                let state = taskgate::EngineState::unmanaged();
                if json {
                    let out = serde_json::json!({ "state": state, "tasks": [] });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    println!("{}", formatter.status_line(&state));
                }
                return Ok(());
            };

            let config = GateConfig::load_or_default(root.path());
            let formatter = StatusFormatter::new(config.status_text_width);
            let active = SessionStore::new(&root, session).load().map(|a| a.task_id);
            let machine = TaskStateMachine::resume(Some(root.clone()), active);
            let state = machine.engine_state();
            let open: Vec<_> = TaskStore::new(&root)
                .list()
                .into_iter()
                .filter(|t| !t.is_done())
                .collect();

            if json {
                let out = serde_json::json!({ "state": state, "tasks": open });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{}", formatter.status_line(&state));
                if !open.is_empty() {
                    println!();
                }
                for task in &open {
                    let head = match &task.summary.current_gate {
                        Some(gate) => formatter.gate_text(gate),
                        None => "(all gates checked)".to_string(),
                    };
                    println!(
                        "{:<40} | {:<8} | {}",
                        task.name,
                        task.summary.progress(),
                        head
                    );
                }
            }
        }

        Commands::List { pending, json } => {
            let root = require_root(&start_dir)?;
            let store = TaskStore::new(&root);
            if !store.tasks_dir().is_dir() {
                println!("No {}/ directory found", TASKS_DIR);
                return Ok(());
            }

            let all = store.list();
            let done = all.iter().filter(|t| t.is_done()).count();
            let pending_count = all.iter().filter(|t| t.status.starts_with("pending")).count();
            let other = all.len() - done - pending_count;
            let rows: Vec<_> = all
                .into_iter()
                .filter(|t| !(pending && t.is_done()))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            if rows.is_empty() && done == 0 {
                println!("No tasks found");
                return Ok(());
            }

            let name_w = rows.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
            let header = format!(
                "{:<name_w$} | {:<7} | {:<8} | Intent",
                "Name", "Status", "Progress"
            );
            println!("{}", header.bold());
            println!(
                "{}-+-{}-+-{}-+-{}",
                "-".repeat(name_w),
                "-".repeat(7),
                "-".repeat(8),
                "-".repeat(40)
            );
            for row in &rows {
                let status: String = row.status.chars().take(7).collect();
                let progress = if row.summary.total_count > 0 {
                    row.summary.progress()
                } else {
                    "-".to_string()
                };
                println!(
                    "{:<name_w$} | {:<7} | {:<8} | {}",
                    row.name, status, progress, row.intent
                );
            }

            let mut parts = Vec::new();
            if done > 0 {
                parts.push(format!("{} done", done));
            }
            if pending_count > 0 {
                parts.push(format!("{} pending", pending_count));
            }
            if other > 0 {
                parts.push(format!("{} other", other));
            }
            let mut summary = format!("\nSummary: {}", parts.join(", "));
            if pending {
                summary.push_str(&format!(" (showing {} open)", rows.len()));
            }
            println!("{}", summary);
            println!("Activate with: taskgate work <number>");
        }

        Commands::New { task_type, name } => {
            let name = name.join(" ");
            // creating the first task is how a project starts, so fall back to --dir
            let root =
                resolve_root(&start_dir).unwrap_or_else(|| ProjectRoot::new(start_dir.clone()));
            let appendix = load_pattern_template(Some(root.path()), task_type);

            let doc = TaskStore::new(&root).create(&name, Some(task_type), appendix.as_deref())?;
            println!(
                "{} Created: {}",
                "OK".green().bold(),
                doc.relative_path(root.path()).display()
            );
            println!("Pattern: {}", task_type.pattern());
            if appendix.is_none() {
                debug!("No playbook pattern found for {}", task_type);
            }
            println!(
                "Next: fill in the task.md gates, then run: taskgate work {}",
                doc.id.number()
            );
        }

        Commands::Init { target } => {
            let target = target.unwrap_or(start_dir);
            let target = target
                .canonicalize()
                .with_context(|| format!("directory not found: {}", target.display()))?;
            init_project(&target)?;
        }

        Commands::Hook { action } => {
            let (raw, decision) = match action {
                HookAction::Run { hook_type, input } => {
                    let raw = hook_input(input);
                    let decision = hooks::run_hook(hook_type, raw.as_deref(), &start_dir, session);
                    (raw, decision)
                }
                HookAction::Decide { action, input } => {
                    let raw = hook_input(input);
                    let payload = hooks::HookInput::parse(raw.as_deref());
                    let decision = hooks::decide_action(action, &payload, &start_dir, session);
                    (raw, decision)
                }
            };
            debug!("Hook payload bytes: {}", raw.map_or(0, |r| r.len()));

            if decision.allow {
                println!("{}", decision.message);
            } else {
                eprintln!("{}", decision.message);
                std::process::exit(hooks::exit_code(&decision));
            }
        }
    }

    Ok(())
}

/// Resolve the project root or fail with a clear message
fn require_root(start_dir: &Path) -> taskgate::Result<ProjectRoot> {
    resolve_root(start_dir).ok_or_else(|| TaskGateError::NotInProject {
        start: start_dir.to_path_buf(),
    })
}

/// Hook payload from the argument, or from stdin when it is piped
fn hook_input(arg: Option<String>) -> Option<String> {
    if arg.is_some() {
        return arg;
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buf = String::new();
    match stdin.lock().read_to_string(&mut buf) {
        Ok(_) => Some(buf),
        Err(e) => {
            debug!("Cannot read hook payload from stdin: {}", e);
            None
        }
    }
}

/// Create the managed-tasks directory and stub top-level files
fn init_project(target: &Path) -> anyhow::Result<()> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = title_case(&name.replace(['-', '_'], " "));
    println!("Initializing project: {}", name);

    let tasks_dir = target.join(TASKS_DIR);
    let existed = tasks_dir.is_dir();
    std::fs::create_dir_all(&tasks_dir)?;
    println!(
        "  {:<14} {}",
        format!("{}/", TASKS_DIR),
        if existed { "exists" } else { "created" }
    );

    let stubs = [
        (MIND_MAP_FILE, mind_map_stub(&title)),
        (CLAUDE_MD_FILE, claude_md_stub(&title)),
    ];
    for (file, content) in stubs {
        let path = target.join(file);
        if path.exists() {
            println!("  {:<14} exists", file);
        } else {
            std::fs::write(&path, content)?;
            println!("  {:<14} created", file);
        }
    }
    Ok(())
}
