use anyhow::{Result, bail};
use image::{ImageBuffer, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::record::FieldMap;
use crate::templates::Template;

pub const CARD_WIDTH_PX: u32 = 400;
pub const CARD_HEIGHT_PX: u32 = 600;
pub const GLYPH_WIDTH: usize = 5;
pub const GLYPH_HEIGHT: usize = 7;

const MARGIN_X: i32 = 40;
const NAME_SCALE: u32 = 4;
const BODY_SCALE: u32 = 2;

/// Visual styles for the built-in painter.
#[derive(Debug, Clone, Copy)]
pub enum CardStyle {
    Classic,
    Night,
    Mono,
}

struct Palette {
    card_bg: Rgba<u8>,
    border: Rgba<u8>,
    header: Option<Rgba<u8>>,
    text: Rgba<u8>,
    accent: Rgba<u8>,
    badge: Rgba<u8>,
    badge_text: Rgba<u8>,
}

/// Built-in raster renderer for card faces and backs.
///
/// Draws each entity kind with a fixed layout keyed by the template's kind,
/// after checking that the field map covers every placeholder the template
/// declares. Output size is constant so sheets pack on a uniform grid.
#[derive(Debug, Clone, Copy)]
pub struct CardPainter {
    style: CardStyle,
}

impl CardPainter {
    pub fn new(style: CardStyle) -> Self {
        Self { style }
    }

    pub fn paint(&self, fields: &FieldMap, template: &Template) -> Result<RgbaImage> {
        for name in template.placeholders()? {
            if !fields.contains_key(&name) {
                bail!(
                    "field map has no value for placeholder '{}' of template '{}'",
                    name,
                    template.name
                );
            }
        }

        let palette = palette(self.style);
        let mut img = ImageBuffer::from_pixel(CARD_WIDTH_PX, CARD_HEIGHT_PX, palette.card_bg);

        if let Some(header_color) = palette.header {
            draw_filled_rect_mut(
                &mut img,
                Rect::at(0, 0).of_size(CARD_WIDTH_PX, 110),
                header_color,
            );
        }
        let border = Rect::at(4, 4).of_size(CARD_WIDTH_PX - 8, CARD_HEIGHT_PX - 8);
        draw_hollow_rect_mut(&mut img, border, palette.border);

        match template.kind.as_str() {
            "asteroid" => self.paint_asteroid(&mut img, fields, &palette),
            "module" => self.paint_module(&mut img, fields, &palette),
            "upgrade" => self.paint_upgrade(&mut img, fields, &palette),
            "action" => self.paint_action(&mut img, fields, &palette),
            "back" => self.paint_back(&mut img, fields, &palette),
            _ => self.paint_generic(&mut img, fields, &palette),
        }

        Ok(img)
    }

    fn paint_asteroid(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        draw_text_centered(img, 200, 40, field(fields, "name"), palette.text, NAME_SCALE);
        let badges = [("r1", 110, 300), ("r2", 250, 300), ("r3", 180, 440)];
        for (slot, cx, cy) in badges {
            let value = field(fields, slot);
            if value.is_empty() {
                continue;
            }
            draw_filled_circle_mut(img, (cx, cy), 54, palette.badge);
            draw_text_centered(img, cx, cy - 10, value, palette.badge_text, 3);
        }
    }

    fn paint_module(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        draw_text_centered(
            img,
            200,
            44,
            field(fields, "Rules Text"),
            palette.text,
            BODY_SCALE,
        );
        let rows = [
            ("ADJ", "Adjacent"),
            ("ANY", "Anywhere 1"),
            ("ANY", "Anywhere 2"),
            ("NOT", "Not Adjacent"),
        ];
        let mut y = 140;
        for (label, slot) in rows {
            let value = field(fields, slot);
            if !value.is_empty() {
                draw_text(img, MARGIN_X, y, label, palette.accent, BODY_SCALE);
                draw_text(img, MARGIN_X + 60, y, value, palette.text, BODY_SCALE);
            }
            y += 34;
        }
        self.paint_cost_rows(
            img,
            fields,
            palette,
            &[
                ("FE", "Iron"),
                ("IC", "Ice"),
                ("SI", "Silicate"),
                ("AU", "Gold"),
                ("U", "Uranium"),
            ],
        );
        self.paint_vp(img, fields, palette);
    }

    fn paint_upgrade(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        draw_text_centered(
            img,
            200,
            44,
            field(fields, "Rules Text"),
            palette.text,
            BODY_SCALE,
        );
        let mut y = 130;
        for slot in 1..=8 {
            let value = field(fields, &format!("Mod{slot}"));
            if !value.is_empty() {
                draw_text(img, MARGIN_X, y, value, palette.text, BODY_SCALE);
            }
            y += 30;
        }
        self.paint_cost_rows(
            img,
            fields,
            palette,
            &[
                ("FE", "Iron"),
                ("IC", "Ice"),
                ("SI", "Silicate"),
                ("AU", "Gold"),
                ("AU>", "Gold Out"),
                ("U", "Uranium"),
                ("U>", "Uranium Out"),
            ],
        );
        self.paint_vp(img, fields, palette);
    }

    fn paint_action(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        draw_text_centered(img, 200, 40, field(fields, "Name"), palette.text, 3);
        draw_text_centered(
            img,
            200,
            94,
            field(fields, "Settlement"),
            palette.accent,
            BODY_SCALE,
        );
        for line in 1..=7 {
            let value = field(fields, &format!("Rules text#{line}"));
            if !value.is_empty() {
                draw_text(
                    img,
                    MARGIN_X,
                    170 + (line as i32 - 1) * 38,
                    value,
                    palette.text,
                    BODY_SCALE,
                );
            }
        }
    }

    fn paint_back(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        let inner = Rect::at(20, 20).of_size(CARD_WIDTH_PX - 40, CARD_HEIGHT_PX - 40);
        draw_hollow_rect_mut(img, inner, palette.accent);
        draw_text_centered(
            img,
            200,
            (CARD_HEIGHT_PX / 2) as i32 - 14,
            field(fields, "name"),
            palette.accent,
            NAME_SCALE,
        );
    }

    fn paint_generic(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        let mut y = 40;
        for (_, value) in fields.iter() {
            if value.is_empty() {
                continue;
            }
            draw_text(img, MARGIN_X, y, value, palette.text, BODY_SCALE);
            y += 30;
            if y > (CARD_HEIGHT_PX as i32) - 40 {
                break;
            }
        }
    }

    fn paint_cost_rows(
        &self,
        img: &mut RgbaImage,
        fields: &FieldMap,
        palette: &Palette,
        costs: &[(&str, &str)],
    ) {
        let mut y = 420;
        for (label, slot) in costs {
            let value = field(fields, slot);
            if value.is_empty() {
                continue;
            }
            draw_text(img, MARGIN_X, y, label, palette.accent, BODY_SCALE);
            draw_text(img, MARGIN_X + 60, y, value, palette.text, BODY_SCALE);
            y += 28;
        }
    }

    fn paint_vp(&self, img: &mut RgbaImage, fields: &FieldMap, palette: &Palette) {
        let vp = field(fields, "VP");
        if !vp.is_empty() {
            let text = format!("{vp} VP");
            draw_text_centered(img, 200, 530, &text, palette.accent, 3);
        }
    }
}

impl Default for CardPainter {
    fn default() -> Self {
        Self::new(CardStyle::Classic)
    }
}

fn field<'a>(fields: &'a FieldMap, name: &str) -> &'a str {
    fields.get(name).map(String::as_str).unwrap_or("")
}

fn palette(style: CardStyle) -> Palette {
    match style {
        CardStyle::Classic => Palette {
            card_bg: rgba(0x1c, 0x27, 0x33, 0xff),
            border: rgba(0xd8, 0xa1, 0x37, 0xff),
            header: Some(rgba(0x14, 0x1c, 0x26, 0xff)),
            text: rgba(0xf2, 0xe3, 0xc2, 0xff),
            accent: rgba(0xd8, 0xa1, 0x37, 0xff),
            badge: rgba(0x5c, 0x6e, 0x80, 0xff),
            badge_text: rgba(0x10, 0x16, 0x1d, 0xff),
        },
        CardStyle::Night => Palette {
            card_bg: rgba(0x0b, 0x0f, 0x14, 0xff),
            border: rgba(0x3c, 0x4a, 0x5a, 0xff),
            header: Some(rgba(0x10, 0x16, 0x1d, 0xff)),
            text: rgba(0xcf, 0xd8, 0xe3, 0xff),
            accent: rgba(0x7f, 0xb0, 0x69, 0xff),
            badge: rgba(0x2a, 0x36, 0x44, 0xff),
            badge_text: rgba(0xcf, 0xd8, 0xe3, 0xff),
        },
        CardStyle::Mono => Palette {
            card_bg: rgba(0xff, 0xff, 0xff, 0xff),
            border: rgba(0x00, 0x00, 0x00, 0xff),
            header: None,
            text: rgba(0x00, 0x00, 0x00, 0xff),
            accent: rgba(0x44, 0x44, 0x44, 0xff),
            badge: rgba(0xdd, 0xdd, 0xdd, 0xff),
            badge_text: rgba(0x00, 0x00, 0x00, 0xff),
        },
    }
}

fn rgba(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
    Rgba([r, g, b, a])
}

fn text_width(text: &str, scale: u32) -> i32 {
    let chars = text.chars().count() as i32;
    if chars == 0 {
        return 0;
    }
    chars * (GLYPH_WIDTH as i32 + 1) * scale as i32 - scale as i32
}

fn draw_text(image: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>, scale: u32) {
    let advance = (GLYPH_WIDTH as i32 + 1) * scale as i32;
    for (idx, ch) in text.chars().enumerate() {
        draw_glyph(image, x + idx as i32 * advance, y, ch, color, scale);
    }
}

fn draw_text_centered(
    image: &mut RgbaImage,
    center_x: i32,
    y: i32,
    text: &str,
    color: Rgba<u8>,
    scale: u32,
) {
    let x = center_x - text_width(text, scale) / 2;
    draw_text(image, x, y, text, color, scale);
}

fn draw_glyph(image: &mut RgbaImage, x: i32, y: i32, ch: char, color: Rgba<u8>, scale: u32) {
    let pattern = glyph_pattern(ch);
    for (row, bits) in pattern.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                let px = x + (col as i32 * scale as i32);
                let py = y + (row as i32 * scale as i32);
                draw_filled_rect_mut(image, Rect::at(px, py).of_size(scale, scale), color);
            }
        }
    }
}

#[rustfmt::skip]
fn glyph_pattern(ch: char) -> [u8; GLYPH_HEIGHT] {
    match ch.to_ascii_uppercase() {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b10010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '/' => [0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000, 0b00000],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '#' => [0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b01010],
        '\'' => [0b00100, 0b00100, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00100, 0b01000],
        '>' => [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000],
        '+' => [0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000, 0b00000],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        '?' => [0b01110, 0b10001, 0b00010, 0b00100, 0b00100, 0b00000, 0b00100],
        ' ' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        _ => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRegistry;
    use crate::mappers::EntityKind;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn faces_come_out_at_the_fixed_card_size() {
        let registry = TemplateRegistry::builtin();
        let painter = CardPainter::default();
        let img = painter
            .paint(
                &fields(&[("name", "Vesta"), ("r1", "Fe"), ("r2", "Fe"), ("r3", "Ic")]),
                registry.face(EntityKind::Asteroid),
            )
            .unwrap();
        assert_eq!((img.width(), img.height()), (CARD_WIDTH_PX, CARD_HEIGHT_PX));
    }

    #[test]
    fn missing_placeholder_value_is_rejected() {
        let registry = TemplateRegistry::builtin();
        let painter = CardPainter::default();
        let err = painter
            .paint(
                &fields(&[("name", "Vesta")]),
                registry.face(EntityKind::Asteroid),
            )
            .unwrap_err();
        assert!(err.to_string().contains("r1"));
    }

    #[test]
    fn styles_pick_distinct_backgrounds() {
        let tpl = Template::new("back", "t", "<svg>{name}</svg>");
        let f = fields(&[("name", "asteroid")]);
        let classic = CardPainter::new(CardStyle::Classic).paint(&f, &tpl).unwrap();
        let mono = CardPainter::new(CardStyle::Mono).paint(&f, &tpl).unwrap();
        assert_ne!(classic.get_pixel(200, 580), mono.get_pixel(200, 580));
    }

    #[test]
    fn badge_circle_lands_where_the_layout_says() {
        let registry = TemplateRegistry::builtin();
        let painter = CardPainter::default();
        let img = painter
            .paint(
                &fields(&[("name", "Vesta"), ("r1", "Fe"), ("r2", ""), ("r3", "")]),
                registry.face(EntityKind::Asteroid),
            )
            .unwrap();
        let badge = palette(CardStyle::Classic).badge;
        assert_eq!(*img.get_pixel(110, 320), badge);
        // empty slots leave the background untouched
        let bg = palette(CardStyle::Classic).card_bg;
        assert_eq!(*img.get_pixel(250, 320), bg);
    }
}
