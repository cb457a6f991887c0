use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;

use movepath::{
    FrameTweenIterator, MoveParameters, MoveSettings, ParameterResolver, PathModel, QueryEngine,
    SegmentScheduler,
};

#[derive(Parser, Debug)]
#[command(name = "movepath", version)]
struct Cli {
    /// Log debug diagnostics to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a path against a destination range before rendering.
    Validate(ValidateArgs),
    /// Print the timing table and segments as JSON.
    Table(TableArgs),
    /// Print resolved attributes for every tween of one frame as JSON.
    Resolve(ResolveArgs),
    /// Print segment motion statistics for one control point as JSON.
    Query(QueryArgs),
    /// Convert between point files and XML parameter files (`.xml` selects XML).
    Convert(ConvertArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Point file or XML parameter file.
    #[arg(long)]
    points: PathBuf,

    /// Number of destination frames (defaults to the range stored in an XML parameter file).
    #[arg(long)]
    frames: Option<u32>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Settings JSON, checked alongside the path.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TableArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Relative destination frame (1-based).
    #[arg(long)]
    frame: u32,

    /// Tween steps between frames.
    #[arg(long)]
    tweens: Option<u32>,
}

#[derive(Parser, Debug)]
struct QueryArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Control point index.
    #[arg(long)]
    point: usize,

    /// Tween steps between frames.
    #[arg(long)]
    tweens: Option<u32>,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Source file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Destination file.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Table(args) => cmd_table(args),
        Command::Resolve(args) => cmd_resolve(args),
        Command::Query(args) => cmd_query(args),
        Command::Convert(args) => cmd_convert(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn read_params(path: &Path) -> anyhow::Result<MoveParameters> {
    if is_xml(path) {
        Ok(MoveParameters::load(path, None)?)
    } else {
        let points = movepath::load_points(path)?;
        Ok(MoveParameters::new(MoveSettings::default(), points))
    }
}

struct Loaded {
    params: MoveParameters,
    frame_count: u32,
}

fn load_input(input: &InputArgs) -> anyhow::Result<Loaded> {
    let params = read_params(&input.points)?;
    let frame_count = match input.frames {
        Some(n) => n,
        None if is_xml(&input.points) => params.settings.frame_count(),
        None => anyhow::bail!("--frames is required for point files"),
    };
    tracing::debug!(
        points = params.path.len(),
        frame_count,
        "loaded {}",
        input.points.display()
    );
    Ok(Loaded {
        params,
        frame_count,
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output JSON")?;
    println!("{json}");
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let loaded = load_input(&args.input)?;
    if let Some(path) = &args.settings {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        MoveSettings::from_json_str(&json)?;
    }

    let report = SegmentScheduler::validate(&loaded.params.path, loaded.frame_count, true);
    if report.is_ok() {
        println!("ok");
        return Ok(());
    }
    println!("{}", report.message());
    anyhow::bail!("{} problem(s) found", report.problems.len())
}

#[derive(Serialize)]
struct TableOutput<'a> {
    frame_count: u32,
    frames: &'a [f64],
    segments: Vec<movepath::Segment>,
}

fn cmd_table(args: TableArgs) -> anyhow::Result<()> {
    let loaded = load_input(&args.input)?;
    let path = &loaded.params.path;
    let table = SegmentScheduler::build_timing_table(path, loaded.frame_count);
    print_json(&TableOutput {
        frame_count: table.frame_count(),
        frames: table.frames(),
        segments: SegmentScheduler::segments(&table),
    })
}

#[derive(Serialize)]
struct ResolvedSample {
    twix: u32,
    position: f64,
    attributes: movepath::ResolvedAttributes,
}

fn check_frame(path: &PathModel, frame: u32, frame_count: u32) -> anyhow::Result<()> {
    if frame == 0 || frame > frame_count {
        anyhow::bail!("frame {frame} is outside 1..={frame_count}");
    }
    SegmentScheduler::validate(path, frame_count, true)
        .into_result()
        .context("path does not fit the frame range")?;
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let loaded = load_input(&args.input)?;
    let path = &loaded.params.path;
    check_frame(path, args.frame, loaded.frame_count)?;

    let tweens = args.tweens.unwrap_or(loaded.params.settings.tween_steps);
    let table = SegmentScheduler::build_timing_table(path, loaded.frame_count);
    let ticks = FrameTweenIterator::new(&table, tweens, None);
    let resolver = ParameterResolver::new(path);

    let samples: Vec<ResolvedSample> = (0..=tweens)
        .rev()
        .map(|twix| ticks.locate(args.frame, twix))
        .filter(|tick| tick.position >= 0.0)
        .map(|tick| ResolvedSample {
            twix: tick.twix,
            position: tick.position,
            attributes: resolver.resolve(&tick),
        })
        .collect();
    print_json(&samples)
}

fn cmd_query(args: QueryArgs) -> anyhow::Result<()> {
    let loaded = load_input(&args.input)?;
    let path = &loaded.params.path;
    if args.point > path.point_idx_max() {
        anyhow::bail!(
            "point {} is outside 0..={}",
            args.point,
            path.point_idx_max()
        );
    }
    let tweens = args.tweens.unwrap_or(loaded.params.settings.tween_steps);
    let result = QueryEngine::new(path, loaded.frame_count, tweens).query(args.point)?;
    print_json(&result)
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let params = read_params(&args.in_path)?;
    if is_xml(&args.out) {
        params.save(&args.out)?;
    } else {
        movepath::save_points(&params.path, &args.out)?;
    }
    tracing::debug!(
        "converted {} -> {}",
        args.in_path.display(),
        args.out.display()
    );
    Ok(())
}
