//! Template discovery commands (`deckpress template ...`).

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use deckpress::EntityKind;

use crate::cli::utils::{load_registry, write_output};

/// Template subcommands.
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List all registered templates.
    List(TemplateListArgs),
    /// Print a template's SVG body.
    Show(TemplateShowArgs),
}

/// Arguments for `deckpress template list`.
#[derive(Args, Debug)]
pub struct TemplateListArgs {
    /// Directory of replacement SVG templates.
    #[arg(long = "templates")]
    pub templates: Option<PathBuf>,
}

/// Arguments for `deckpress template show`.
#[derive(Args, Debug)]
pub struct TemplateShowArgs {
    /// Slot to show: an entity kind name or `back`.
    pub slot: String,
    /// Directory of replacement SVG templates.
    #[arg(long = "templates")]
    pub templates: Option<PathBuf>,
    /// Output path (`-` for stdout).
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,
}

/// Execute a template command.
pub fn handle(cmd: TemplateCommand) -> Result<()> {
    match cmd {
        TemplateCommand::List(args) => list(args),
        TemplateCommand::Show(args) => show(args),
    }
}

fn list(args: TemplateListArgs) -> Result<()> {
    let registry = load_registry(args.templates.as_deref())?;
    for template in registry.list() {
        let placeholders = template.placeholders()?;
        println!(
            "{:<10} {:<24} {} placeholder(s)",
            template.kind,
            template.name,
            placeholders.len()
        );
    }
    Ok(())
}

fn show(args: TemplateShowArgs) -> Result<()> {
    let registry = load_registry(args.templates.as_deref())?;
    let template = if args.slot.eq_ignore_ascii_case("back") {
        registry.back()
    } else {
        let kind = EntityKind::parse(&args.slot)
            .ok_or_else(|| anyhow!("unknown template slot '{}'", args.slot))?;
        registry.face(kind)
    };
    write_output(&args.output, &template.body)
}
