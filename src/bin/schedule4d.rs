use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "schedule4d", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the frame window of every task.
    Windows(CommonArgs),
    /// Print resolved product states, either at one frame or as change lists.
    States(StatesArgs),
    /// Print the adapter calls a full rebuild would issue.
    Batches(CommonArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct StatesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Only print the state of every product at this frame.
    #[arg(long)]
    frame: Option<i64>,
}

#[derive(serde::Serialize)]
struct WindowRow<'a> {
    task: schedule4d::TaskId,
    name: &'a str,
    start: schedule4d::FrameIndex,
    finish: schedule4d::FrameIndex,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Windows(args) => cmd_windows(args),
        Command::States(args) => cmd_states(args),
        Command::Batches(args) => cmd_batches(args),
    }
}

fn read_project_json(path: &Path) -> anyhow::Result<schedule4d::Project> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let project = schedule4d::Project::from_reader(BufReader::new(f))
        .with_context(|| format!("parse project '{}'", path.display()))?;
    Ok(project)
}

fn write_json(out: Option<&Path>, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(path)
                .with_context(|| format!("create output '{}'", path.display()))?;
            serde_json::to_writer_pretty(f, value)
                .with_context(|| format!("write output '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, value).context("write stdout")?;
            writeln!(stdout).context("write stdout")?;
        }
    }
    Ok(())
}

fn cmd_windows(args: CommonArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    let names: std::collections::HashMap<schedule4d::TaskId, String> = project
        .schedule
        .tasks
        .iter()
        .map(|t| (t.id, t.name.clone()))
        .collect();

    let mut session = project.into_session();
    let build = session.build().context("build animation")?;
    let rows: Vec<WindowRow<'_>> = build
        .windows
        .iter()
        .map(|w| WindowRow {
            task: w.task,
            name: names.get(&w.task).map(String::as_str).unwrap_or(""),
            start: w.start,
            finish: w.finish,
        })
        .collect();

    eprintln!(
        "{} of {} tasks have a window over frames {}..={}",
        rows.len(),
        build.stats.tasks_indexed,
        build.timeline.frames.start.0,
        build.timeline.frames.end.0
    );
    write_json(args.out.as_deref(), &rows)
}

fn cmd_states(args: StatesArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.common.in_path)?;
    let mut session = project.into_session();
    let build = session.build().context("build animation")?;

    match args.frame {
        Some(f) => {
            let frame = schedule4d::FrameIndex(f);
            anyhow::ensure!(
                build.timeline.frames.contains(frame),
                "frame {f} is outside the animation range {}..={}",
                build.timeline.frames.start.0,
                build.timeline.frames.end.0
            );
            let states: Vec<_> = build.table.states_at(frame).collect();
            write_json(args.common.out.as_deref(), &states)
        }
        None => {
            eprintln!(
                "{} products, {} state keys, fingerprint {}",
                build.table.tracks().len(),
                build.stats.state_keys,
                build.stats.fingerprint
            );
            write_json(args.common.out.as_deref(), &build.table)
        }
    }
}

fn cmd_batches(args: CommonArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    let mut session = project.into_session();
    let mut adapter = schedule4d::RecordingAdapter::new();
    let (_, report) = session
        .rebuild(&mut adapter)
        .context("rebuild animation")?;

    eprintln!(
        "{} batches, {} applied, {} objects touched",
        report.batches, report.applied, report.objects_touched
    );
    for f in &report.failures {
        eprintln!("batch at frame {} failed: {}", f.frame.0, f.error);
    }
    write_json(args.out.as_deref(), &adapter.calls)
}
