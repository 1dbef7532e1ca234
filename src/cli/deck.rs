//! Deck build commands (`deckpress deck ...`).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use deckpress::{
    BuildSummary, CardPainter, DeckPipeline, DirUploader, GamePackage, GridSpec, Record,
    build_kind_decks,
};

use crate::cli::common::StyleArg;
use crate::cli::utils::load_registry;

/// Supported `deckpress deck` subcommands.
#[derive(Subcommand, Debug)]
pub enum DeckCommand {
    /// Build game packages for every kind listed in a manifest.
    Build(DeckBuildArgs),
    /// Summarize a generated game package.
    Info(DeckInfoArgs),
}

/// Arguments for `deckpress deck build`.
#[derive(Args, Debug)]
pub struct DeckBuildArgs {
    /// Manifest file: a JSON object mapping kind names to JSONL record files.
    pub manifest: PathBuf,
    /// Output directory for packages and sheets.
    #[arg(short = 'o', long = "output", default_value = "out")]
    pub output: PathBuf,
    /// Painter style for card faces and backs.
    #[arg(long, value_enum, default_value_t = StyleArg::Classic)]
    pub style: StyleArg,
    /// Directory of replacement SVG templates.
    #[arg(long = "templates")]
    pub templates: Option<PathBuf>,
    /// Cards per sheet row.
    #[arg(long = "num-width", default_value_t = 10)]
    pub num_width: u32,
    /// Sheet rows.
    #[arg(long = "num-height", default_value_t = 7)]
    pub num_height: u32,
}

/// Arguments for `deckpress deck info`.
#[derive(Args, Debug)]
pub struct DeckInfoArgs {
    /// Game package file produced by `deck build`.
    pub package: PathBuf,
}

/// Execute a deck command.
pub fn handle(cmd: DeckCommand) -> Result<()> {
    match cmd {
        DeckCommand::Build(args) => build(args),
        DeckCommand::Info(args) => info(args),
    }
}

fn build(args: DeckBuildArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.manifest)
        .with_context(|| format!("failed to read manifest {}", args.manifest.display()))?;
    let manifest: BTreeMap<String, PathBuf> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse manifest {}", args.manifest.display()))?;

    let registry = load_registry(args.templates.as_deref())?;
    let grid = GridSpec {
        num_width: args.num_width,
        num_height: args.num_height,
        xpad: 0,
        ypad: 0,
    };
    let pipeline = DeckPipeline::new(
        CardPainter::new(args.style.into()),
        DirUploader::new(args.output.join("sheets")),
        grid,
    );
    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let mut summary = BuildSummary::new();
    for (name, source) in &manifest {
        println!("Processing {name}...");
        let Some(kind) = deckpress::EntityKind::parse(name) else {
            println!("(skipping {name}: no mapper for this kind)");
            continue;
        };
        let records = Record::load_jsonl(source)?;
        let decks = match build_kind_decks(&pipeline, &registry, kind, &records) {
            Ok(decks) => decks,
            Err(err) => {
                eprintln!("failed to build {name} decks: {err:#}");
                continue;
            }
        };
        let deck_count = decks.len();
        let package = GamePackage::new(decks);
        let path = args.output.join(format!("{name}.json"));
        let body = serde_json::to_string(&package)
            .with_context(|| format!("failed to serialize {name} package"))?;
        fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        println!(
            "{}: {} records -> {} deck(s), wrote {}",
            name,
            records.len(),
            deck_count,
            path.display()
        );
        summary.push(name.as_str(), records.len(), deck_count);
    }

    let summary_path = args.output.join("summary.json");
    let body = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
    fs::write(&summary_path, body)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    println!("Summary written to {}", summary_path.display());
    Ok(())
}

fn info(args: DeckInfoArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.package)
        .with_context(|| format!("failed to read {}", args.package.display()))?;
    let package: GamePackage = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.package.display()))?;
    println!("{}", args.package.display());
    println!("decks: {}", package.object_states.len());
    for (idx, deck) in package.object_states.iter().enumerate() {
        let spec = deck.custom_deck.get("1");
        println!(
            "  deck {} [{}]: {} cards, face {}",
            idx + 1,
            deck.guid,
            deck.deck_ids.len(),
            spec.map(|s| s.face_url.as_str()).unwrap_or("?")
        );
    }
    Ok(())
}
