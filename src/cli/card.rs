//! Single-card operations (`deckpress card ...`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use deckpress::{BackMapper, CardPainter, EntityKind, FieldMapper};

use crate::cli::common::{KindArg, StyleArg};
use crate::cli::utils::{load_registry, parse_record, read_text_arg, write_output};

/// Supported `deckpress card` subcommands.
#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Paint one card to a PNG with the built-in renderer.
    Render(CardRenderArgs),
    /// Interpolate one card into its SVG template.
    Svg(CardSvgArgs),
}

/// Shared input selection for single-card commands.
#[derive(Args, Debug)]
pub struct CardInput {
    /// Entity kind of the record.
    #[arg(long, value_enum)]
    pub kind: KindArg,
    /// Inline JSON record.
    #[arg(long)]
    pub record: Option<String>,
    /// File containing the JSON record (`-` for stdin).
    #[arg(long = "from")]
    pub from: Option<PathBuf>,
    /// Use the generic back design instead of the face.
    #[arg(long)]
    pub back: bool,
    /// Directory of replacement SVG templates.
    #[arg(long = "templates")]
    pub templates: Option<PathBuf>,
}

/// Arguments for `deckpress card render`.
#[derive(Args, Debug)]
pub struct CardRenderArgs {
    #[command(flatten)]
    pub input: CardInput,
    /// Output PNG path.
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Painter style.
    #[arg(long, value_enum, default_value_t = StyleArg::Classic)]
    pub style: StyleArg,
}

/// Arguments for `deckpress card svg`.
#[derive(Args, Debug)]
pub struct CardSvgArgs {
    #[command(flatten)]
    pub input: CardInput,
    /// Output SVG path (`-` for stdout).
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

/// Execute a card command.
pub fn handle(cmd: CardCommand) -> Result<()> {
    match cmd {
        CardCommand::Render(args) => render(args),
        CardCommand::Svg(args) => svg(args),
    }
}

fn map_input(input: &CardInput) -> Result<(deckpress::FieldMap, deckpress::TemplateRegistry)> {
    let kind: EntityKind = input.kind.into();
    let raw = read_text_arg(input.record.clone(), input.from.clone())?;
    let record = parse_record(&raw)?;
    let registry = load_registry(input.templates.as_deref())?;
    let fields = if input.back {
        BackMapper::new(kind.name()).map(&record)?
    } else {
        kind.mapper().map(&record)?
    };
    Ok((fields, registry))
}

fn render(args: CardRenderArgs) -> Result<()> {
    let (fields, registry) = map_input(&args.input)?;
    let template = if args.input.back {
        registry.back()
    } else {
        registry.face(args.input.kind.into())
    };
    let painter = CardPainter::new(args.style.into());
    let image = painter.paint(&fields, template)?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "Rendered {} card to {}",
        template.kind,
        args.output.display()
    );
    Ok(())
}

fn svg(args: CardSvgArgs) -> Result<()> {
    let (fields, registry) = map_input(&args.input)?;
    let template = if args.input.back {
        registry.back()
    } else {
        registry.face(args.input.kind.into())
    };
    let body = template.interpolate(&fields)?;
    write_output(&args.output, &body)
}
