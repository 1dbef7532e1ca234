//! Core library for card sheet generation and Tabletop Simulator deck packaging.

mod graphics;
mod mappers;
mod pipeline;
mod record;
mod sheet;
mod templates;
mod tts;
mod wrap;

pub use graphics::{CARD_HEIGHT_PX, CARD_WIDTH_PX, CardPainter, CardStyle};
pub use mappers::{
    ActionMapper, AsteroidMapper, BackMapper, EntityKind, FieldMapper, MapError, ModuleMapper,
    UpgradeMapper,
};
pub use pipeline::{
    BuildSummary, CardRenderer, DeckPipeline, DirUploader, FaceAuthor, KindSummary, SheetUploader,
};
pub use record::{FieldMap, Record};
pub use sheet::{GridSpec, PackError, Sheet, pack_sheet};
pub use templates::{Template, TemplateError, TemplateRegistry};
pub use tts::{
    ColorDiffuse, CustomDeckSpec, FIRST_DECK_ID, GamePackage, Transform, TtsCard, TtsDeck,
    derive_guid,
};
pub use wrap::split_to_fields;

use anyhow::Result;

/// Build all decks for one entity kind, pairing its face mapper and template
/// with the generic back.
pub fn build_kind_decks<R: CardRenderer, U: SheetUploader>(
    pipeline: &DeckPipeline<R, U>,
    registry: &TemplateRegistry,
    kind: EntityKind,
    records: &[Record],
) -> Result<Vec<TtsDeck>> {
    let front_mapper = kind.mapper();
    let back_mapper = BackMapper::new(kind.name());
    let front = FaceAuthor {
        mapper: front_mapper.as_ref(),
        template: registry.face(kind),
    };
    let back = FaceAuthor {
        mapper: &back_mapper,
        template: registry.back(),
    };
    pipeline.make_decks(records, &front, &back)
}
