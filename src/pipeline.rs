use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::graphics::CardPainter;
use crate::mappers::FieldMapper;
use crate::record::{FieldMap, Record};
use crate::sheet::{GridSpec, Sheet, pack_sheet};
use crate::templates::Template;
use crate::tts::TtsDeck;

/// Turns one card's fields into a raster image of the given template.
pub trait CardRenderer {
    fn render(&self, fields: &FieldMap, template: &Template) -> Result<RgbaImage>;
}

impl CardRenderer for CardPainter {
    fn render(&self, fields: &FieldMap, template: &Template) -> Result<RgbaImage> {
        self.paint(fields, template)
    }
}

/// Publishes a packed sheet and returns the URL decks should reference.
pub trait SheetUploader {
    fn upload(&self, sheet: &Sheet) -> Result<String>;
}

/// One side of a card: how to map a record and which template it renders on.
#[derive(Clone, Copy)]
pub struct FaceAuthor<'a> {
    pub mapper: &'a dyn FieldMapper,
    pub template: &'a Template,
}

/// Batches records into sheet-sized decks and drives map, render, pack,
/// upload and assembly for each batch.
///
/// Errors from any stage abort the current batch and propagate; no partial
/// deck is emitted.
pub struct DeckPipeline<R, U> {
    renderer: R,
    uploader: U,
    grid: GridSpec,
}

impl<R: CardRenderer, U: SheetUploader> DeckPipeline<R, U> {
    pub fn new(renderer: R, uploader: U, grid: GridSpec) -> Self {
        Self {
            renderer,
            uploader,
            grid,
        }
    }

    /// Build one deck per consecutive batch of grid-capacity records.
    ///
    /// Card order inside a deck follows record order; each deck numbers its
    /// cards independently. An empty record set produces no decks.
    pub fn make_decks(
        &self,
        records: &[Record],
        front: &FaceAuthor<'_>,
        back: &FaceAuthor<'_>,
    ) -> Result<Vec<TtsDeck>> {
        let capacity = self.grid.capacity();
        ensure!(capacity > 0, "sheet grid has zero capacity");
        let mut decks = Vec::new();
        for batch in records.chunks(capacity) {
            decks.push(self.make_deck(batch, front, back)?);
        }
        Ok(decks)
    }

    fn make_deck(
        &self,
        batch: &[Record],
        front: &FaceAuthor<'_>,
        back: &FaceAuthor<'_>,
    ) -> Result<TtsDeck> {
        let face_url = self.publish_side(batch, front)?;
        let back_url = self.publish_side(batch, back)?;
        TtsDeck::assemble(&face_url, &back_url, batch.len(), &self.grid)
    }

    fn publish_side(&self, batch: &[Record], side: &FaceAuthor<'_>) -> Result<String> {
        let mut images = Vec::with_capacity(batch.len());
        for record in batch {
            let fields = side.mapper.map(record)?;
            images.push(self.renderer.render(&fields, side.template)?);
        }
        let sheet = pack_sheet(&images, &self.grid)?;
        self.uploader.upload(&sheet)
    }
}

/// Uploader that writes sheets as numbered PNGs into a directory and hands
/// back `file://` URLs.
pub struct DirUploader {
    dir: PathBuf,
    counter: Cell<usize>,
}

impl DirUploader {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            counter: Cell::new(0),
        }
    }
}

impl SheetUploader for DirUploader {
    fn upload(&self, sheet: &Sheet) -> Result<String> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create sheet directory {}", self.dir.display()))?;
        let index = self.counter.get();
        self.counter.set(index + 1);
        let path = self.dir.join(format!("sheet-{index:03}.png"));
        sheet
            .image
            .save(&path)
            .with_context(|| format!("failed to write sheet {}", path.display()))?;
        let absolute = fs::canonicalize(&path)
            .with_context(|| format!("failed to resolve sheet path {}", path.display()))?;
        Ok(format!("file://{}", absolute.display()))
    }
}

/// Per-kind counts for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindSummary {
    pub kind: String,
    pub records: usize,
    pub decks: usize,
}

/// Record of a full build, written next to the generated packages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildSummary {
    pub generated_at: DateTime<Utc>,
    pub kinds: Vec<KindSummary>,
}

impl BuildSummary {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            kinds: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, kind: S, records: usize, decks: usize) {
        self.kinds.push(KindSummary {
            kind: kind.into(),
            records,
            decks,
        });
    }
}

impl Default for BuildSummary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::{AsteroidMapper, BackMapper};
    use pretty_assertions::assert_eq;

    struct CountingRenderer {
        calls: Cell<usize>,
    }

    impl CardRenderer for CountingRenderer {
        fn render(&self, _fields: &FieldMap, _template: &Template) -> Result<RgbaImage> {
            self.calls.set(self.calls.get() + 1);
            Ok(RgbaImage::new(4, 6))
        }
    }

    struct CountingUploader {
        calls: Cell<usize>,
    }

    impl SheetUploader for CountingUploader {
        fn upload(&self, _sheet: &Sheet) -> Result<String> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            Ok(format!("mem://sheet/{n}"))
        }
    }

    fn pipeline(grid: GridSpec) -> DeckPipeline<CountingRenderer, CountingUploader> {
        DeckPipeline::new(
            CountingRenderer {
                calls: Cell::new(0),
            },
            CountingUploader {
                calls: Cell::new(0),
            },
            grid,
        )
    }

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let mut r = Record::new();
                r.insert("Name", format!("Card {i}"));
                r
            })
            .collect()
    }

    #[test]
    fn batches_split_at_grid_capacity() {
        let grid = GridSpec {
            num_width: 2,
            num_height: 1,
            xpad: 0,
            ypad: 0,
        };
        let p = pipeline(grid);
        let mapper = BackMapper::new("test");
        let template = Template::new("back", "t", "<svg>{name}</svg>");
        let author = FaceAuthor {
            mapper: &mapper,
            template: &template,
        };
        let decks = p.make_decks(&records(5), &author, &author).unwrap();
        assert_eq!(decks.len(), 3);
        assert_eq!(decks[0].deck_ids, vec![100, 101]);
        assert_eq!(decks[1].deck_ids, vec![100, 101]);
        assert_eq!(decks[2].deck_ids, vec![100]);
        // two sheets per deck, front then back
        assert_eq!(p.uploader.calls.get(), 6);
        assert_eq!(p.renderer.calls.get(), 10);
        assert_eq!(decks[0].custom_deck["1"].face_url, "mem://sheet/0");
        assert_eq!(decks[0].custom_deck["1"].back_url, "mem://sheet/1");
    }

    #[test]
    fn no_records_means_no_decks() {
        let p = pipeline(GridSpec::default());
        let mapper = BackMapper::new("test");
        let template = Template::new("back", "t", "<svg>{name}</svg>");
        let author = FaceAuthor {
            mapper: &mapper,
            template: &template,
        };
        let decks = p.make_decks(&[], &author, &author).unwrap();
        assert!(decks.is_empty());
        assert_eq!(p.uploader.calls.get(), 0);
    }

    #[test]
    fn mapper_failure_aborts_the_batch() {
        let p = pipeline(GridSpec::default());
        let front_mapper = AsteroidMapper;
        let front_tpl = Template::new("asteroid", "t", "<svg>{name}</svg>");
        let back_mapper = BackMapper::new("asteroid");
        let back_tpl = Template::new("back", "t", "<svg>{name}</svg>");
        let front = FaceAuthor {
            mapper: &front_mapper,
            template: &front_tpl,
        };
        let back = FaceAuthor {
            mapper: &back_mapper,
            template: &back_tpl,
        };
        let mut nameless = Record::new();
        nameless.insert("Iron", "2");
        let err = p.make_decks(&[nameless], &front, &back).unwrap_err();
        assert!(err.to_string().contains("Name"));
        assert_eq!(p.uploader.calls.get(), 0);
    }

    #[test]
    fn dir_uploader_writes_numbered_sheets() {
        let dir = std::env::temp_dir().join(format!("deckpress-sheets-{}", std::process::id()));
        let uploader = DirUploader::new(&dir);
        let sheet = Sheet {
            image: RgbaImage::new(8, 8),
            num_width: 1,
            num_height: 1,
        };
        let first = uploader.upload(&sheet).unwrap();
        let second = uploader.upload(&sheet).unwrap();
        assert!(first.starts_with("file://"));
        assert!(first.ends_with("sheet-000.png"));
        assert!(second.ends_with("sheet-001.png"));
        assert!(dir.join("sheet-000.png").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
