use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "menuclip", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a project into a menu tree, animations and parameters.
    Compile(CompileArgs),
    /// Validate and compile a project, printing diagnostics and the output fingerprint.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Compile settings JSON. Missing fields take their defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output JSON path. Written to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Fail when the pass records any diagnostic.
    #[arg(long)]
    deny_diagnostics: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Compile settings JSON.
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| format!("parse {what} JSON"))
}

fn load(
    in_path: &Path,
    settings: Option<&Path>,
) -> anyhow::Result<(menuclip::Project, menuclip::CompileSettings)> {
    let project: menuclip::Project = read_json(in_path, "project")?;
    let settings = match settings {
        Some(p) => read_json(p, "settings")?,
        None => menuclip::CompileSettings::default(),
    };
    Ok((project, settings))
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let (project, settings) = load(&args.in_path, args.settings.as_deref())?;
    let output = menuclip::compile(&project, &settings)?;

    for d in &output.diagnostics {
        eprintln!("diagnostic: {}", serde_json::to_string(d)?);
    }
    if args.deny_diagnostics && !output.diagnostics.is_empty() {
        anyhow::bail!(
            "{} diagnostic(s) recorded and --deny-diagnostics is set",
            output.diagnostics.len()
        );
    }

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            let f = File::create(out).with_context(|| format!("create '{}'", out.display()))?;
            let mut w = BufWriter::new(f);
            serde_json::to_writer_pretty(&mut w, &output)
                .with_context(|| format!("write '{}'", out.display()))?;
            w.flush()?;
            eprintln!("wrote {}", out.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &output).context("write output")?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let (project, settings) = load(&args.in_path, args.settings.as_deref())?;
    let output = menuclip::compile(&project, &settings)?;
    let fingerprint = menuclip::fingerprint_output(&output)?;

    println!("project:     {}", output.project);
    println!("animations:  {}", output.animations.len());
    println!("parameters:  {}", output.parameters.len());
    println!("diagnostics: {}", output.diagnostics.len());
    for (kind, count) in menuclip::compile::diagnostic_summary(&output.diagnostics) {
        println!("  {kind}: {count}");
    }
    println!("fingerprint: {fingerprint}");
    Ok(())
}
