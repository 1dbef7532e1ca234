//! Shared clap helper types for CLI commands.

use clap::ValueEnum;
use deckpress::{CardStyle, EntityKind};

/// Entity kind selector used by several commands.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum KindArg {
    Asteroid,
    Module,
    Upgrade,
    Action,
}

impl From<KindArg> for EntityKind {
    fn from(value: KindArg) -> EntityKind {
        match value {
            KindArg::Asteroid => EntityKind::Asteroid,
            KindArg::Module => EntityKind::Module,
            KindArg::Upgrade => EntityKind::Upgrade,
            KindArg::Action => EntityKind::Action,
        }
    }
}

/// Painter styles available for raster output.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum StyleArg {
    Classic,
    Night,
    Mono,
}

impl From<StyleArg> for CardStyle {
    fn from(value: StyleArg) -> CardStyle {
        match value {
            StyleArg::Classic => CardStyle::Classic,
            StyleArg::Night => CardStyle::Night,
            StyleArg::Mono => CardStyle::Mono,
        }
    }
}
