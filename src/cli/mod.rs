//! Command-line interface wiring for the `deckpress` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! specialized submodules that encapsulate each command family.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod card;
pub mod common;
pub mod deck;
pub mod template;
pub mod utils;

/// Parsed CLI entrypoint for the `deckpress` binary.
#[derive(Parser, Debug)]
#[command(
    name = "deckpress",
    version,
    about = "Card sheet and Tabletop Simulator deck generator"
)]
pub struct Cli {
    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// High-level command families made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Deck(deck::DeckCommand),
    #[command(subcommand)]
    Card(card::CardCommand),
    #[command(subcommand)]
    Template(template::TemplateCommand),
}

/// Execute the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Deck(cmd) => deck::handle(cmd),
        Command::Card(cmd) => card::handle(cmd),
        Command::Template(cmd) => template::handle(cmd),
    }
}
