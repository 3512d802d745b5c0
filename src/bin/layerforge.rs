use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use layerforge::{
    AssetStore, BatchProgress, CancelToken, EDITED_ARCHIVE_NAME, ExportFormat, ExportOptions,
    GENERATED_ARCHIVE_NAME, NO_PREVIOUS_PREVIEW, PackOptions, PhotoProducer, PreviewSession,
    ProjectConfig, TraitComposer, export_selection, pack, run_batch,
};

#[derive(Parser, Debug)]
#[command(name = "layerforge", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a collection from the project's layers into `memories.zip`.
    Generate(GenerateArgs),
    /// Render interactive previews and write the one under the cursor as a PNG.
    Preview(PreviewArgs),
    /// Apply the filter and per-photo geometry to the project's photos.
    Edit(EditArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for the archive.
    #[arg(long)]
    out: PathBuf,

    /// Number of items (overrides the project).
    #[arg(long)]
    count: Option<usize>,

    /// Random seed (overrides the project).
    #[arg(long)]
    seed: Option<u64>,

    /// Render items on a thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads when `--parallel` is set.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// How many previews to generate.
    #[arg(long, default_value_t = 1)]
    advance: usize,

    /// How many times to step back afterwards.
    #[arg(long, default_value_t = 0)]
    back: usize,

    /// Random seed (overrides the project).
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct EditArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Filter preset (overrides the project filter).
    #[arg(long, value_enum)]
    preset: Option<layerforge::FilterPreset>,

    /// Export format (overrides the project).
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,

    /// JPEG quality in [0.5, 1.0] (overrides the project).
    #[arg(long)]
    quality: Option<f64>,

    /// Only export selected photos: one file for a single photo, else `selected_edit.zip`.
    #[arg(long)]
    selected: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Edit(args) => cmd_edit(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_project(path: &Path) -> anyhow::Result<(ProjectConfig, PathBuf)> {
    let cfg = ProjectConfig::from_path(path)?;
    let root = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    Ok((cfg, root))
}

fn resolve_seed(cli: Option<u64>, project: Option<u64>) -> u64 {
    let seed = cli.or(project).unwrap_or_else(rand::random);
    tracing::info!(seed, "using seed");
    seed
}

fn report(p: BatchProgress) {
    tracing::info!("{}", p.status());
}

fn write_output(dir: &Path, file_name: &str, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir '{}'", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let (mut cfg, root) = load_project(&args.in_path)?;
    if let Some(count) = args.count {
        cfg.generate_count = count;
    }
    if args.parallel {
        cfg.threading.parallel = true;
    }
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }
    cfg.validate()?;

    let layers = cfg.build_layers()?;
    let assets = AssetStore::prepare_layers(root, &layers);
    let seed = resolve_seed(args.seed, cfg.seed);
    let composer = TraitComposer::new(&layers, &assets, cfg.canvas, cfg.generate_count, seed)?;

    let out = run_batch(&composer, &cfg.threading, &CancelToken::new(), report)?;
    let packed = pack(
        &out.entries,
        &PackOptions::generated(&cfg.meta_name_template, &cfg.meta_description),
    )?;
    write_output(&args.out, GENERATED_ARCHIVE_NAME, &packed.bytes)?;
    eprintln!(
        "{} rendered, {} skipped, {} unique combination(s)",
        out.stats.items_rendered, out.stats.items_skipped, out.stats.unique_combinations
    );
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let (cfg, root) = load_project(&args.in_path)?;
    let layers = cfg.build_layers()?;
    let assets = AssetStore::prepare_layers(root, &layers);
    let seed = resolve_seed(args.seed, cfg.seed);

    let mut session = PreviewSession::new(&layers, &assets, cfg.canvas, seed)?;
    for _ in 0..args.advance.max(1) {
        session.advance()?;
    }
    for _ in 0..args.back {
        if session.step_back().is_none() {
            eprintln!("{NO_PREVIOUS_PREVIEW}");
            break;
        }
    }

    let item = session
        .history()
        .current()
        .context("preview history is empty")?;
    for s in &item.selections {
        eprintln!("{}: {}", s.layer_name, s.trait_display_name);
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &item.surface.to_straight_rgba8(),
        item.surface.width(),
        item.surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_edit(args: EditArgs) -> anyhow::Result<()> {
    let (mut cfg, root) = load_project(&args.in_path)?;
    if args.preset.is_some() {
        cfg.preset = args.preset;
    }
    let export = ExportOptions {
        format: args.format.unwrap_or(cfg.export.format),
        jpg_quality: args.quality.unwrap_or(cfg.export.jpg_quality),
    };
    export.validate()?;

    let (photos, mut selection) = cfg.build_photos()?;
    if !args.selected {
        selection.clear();
    } else if selection.is_empty() {
        anyhow::bail!("--selected given but no photo is marked \"selected\" in the project");
    }
    let assets = AssetStore::prepare_photos(root, &photos);
    let producer = PhotoProducer::new(&photos, &selection, &assets, cfg.effective_filter())?;

    let out = run_batch(&producer, &cfg.threading, &CancelToken::new(), report)?;
    if args.selected {
        let file = export_selection(&out.entries, &export)?;
        write_output(&args.out, &file.file_name, &file.bytes)?;
    } else {
        let packed = pack(&out.entries, &PackOptions::edited(export))?;
        write_output(&args.out, EDITED_ARCHIVE_NAME, &packed.bytes)?;
    }
    if out.stats.items_skipped > 0 {
        eprintln!("{} photo(s) skipped", out.stats.items_skipped);
    }
    Ok(())
}
