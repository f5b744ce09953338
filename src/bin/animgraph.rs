use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use animgraph::{ExecuteOptions, Issue, Registries, Severity, UserFacingError};
use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "animgraph", version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Extra node type definitions (JSON array) added to the built-in catalogue.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Log engine activity to stderr (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a flow and write its scene partitions as JSON.
    Run(RunArgs),
    /// Validate a flow and print the issues found.
    Validate(ValidateArgs),
    /// Execute a flow up to one node and print the result entries of the log.
    Debug(DebugArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input flow JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path for the partitions (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Do not require a scene or frame node.
    #[arg(long)]
    scene_optional: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input flow JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct DebugArgs {
    /// Input flow JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Node to stop after.
    #[arg(long)]
    target: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.common.verbose);
    let registries = load_registries(cli.common.registry.as_deref())?;
    match cli.cmd {
        Command::Run(args) => cmd_run(args, &registries),
        Command::Validate(args) => cmd_validate(args, &registries),
        Command::Debug(args) => cmd_debug(args, &registries),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "animgraph=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_registries(path: Option<&Path>) -> anyhow::Result<Registries> {
    let registries = Registries::builtin();
    let Some(path) = path else {
        return Ok(registries);
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read node registry '{}'", path.display()))?;
    registries
        .with_node_types_json(&json)
        .map_err(user_facing)
        .with_context(|| format!("load node registry '{}'", path.display()))
}

fn user_facing(err: animgraph::FlowError) -> anyhow::Error {
    let ufe = UserFacingError::from(&err);
    let mut msg = ufe.to_string();
    for s in &ufe.suggestions {
        msg.push_str("\n  hint: ");
        msg.push_str(s);
    }
    anyhow::Error::msg(msg)
}

fn print_issues(issues: &[Issue]) {
    for issue in issues {
        eprintln!("{}: {issue}", severity_label(issue.severity));
        for s in &issue.suggestions {
            eprintln!("  hint: {s}");
        }
    }
}

fn severity_label(s: Severity) -> &'static str {
    match s {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

fn cmd_run(args: RunArgs, registries: &Registries) -> anyhow::Result<()> {
    let flow = animgraph::load_flow(&args.in_path, registries).map_err(user_facing)?;
    let options = ExecuteOptions {
        require_terminal: !args.scene_optional,
    };
    let run = animgraph::run_flow(&flow, registries, &options).map_err(user_facing)?;
    print_issues(run.context.issues());

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(out)
                .with_context(|| format!("create partitions file '{}'", out.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut w, &run.partitions)
                .with_context(|| "serialize partitions")?;
            w.flush()?;
            eprintln!("wrote {} partition(s) to {}", run.partitions.len(), out.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            serde_json::to_writer_pretty(&mut w, &run.partitions)
                .with_context(|| "serialize partitions")?;
            writeln!(w)?;
        }
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs, registries: &Registries) -> anyhow::Result<()> {
    let flow = animgraph::load_flow(&args.in_path, registries).map_err(user_facing)?;
    let issues =
        animgraph::validate_flow(&flow.nodes, &flow.edges, registries).map_err(user_facing)?;
    print_issues(&issues);

    let errors = issues.iter().filter(|i| i.is_error()).count();
    if errors > 0 {
        anyhow::bail!("{errors} error(s) in '{}'", args.in_path.display());
    }
    eprintln!("ok: {} issue(s), no errors", issues.len());
    Ok(())
}

fn cmd_debug(args: DebugArgs, registries: &Registries) -> anyhow::Result<()> {
    let flow = animgraph::load_flow(&args.in_path, registries).map_err(user_facing)?;
    let ctx = animgraph::execute_flow_debug(&flow.nodes, &flow.edges, registries, &args.target)
        .map_err(user_facing)?;
    print_issues(ctx.issues());

    let results: Vec<_> = ctx.results().collect();
    let stdout = std::io::stdout();
    let mut w = stdout.lock();
    serde_json::to_writer_pretty(
        &mut w,
        &serde_json::json!({
            "visited": ctx.execution_order(),
            "results": results,
        }),
    )
    .with_context(|| "serialize debug output")?;
    writeln!(w)?;
    Ok(())
}
