use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::mappers::EntityKind;
use crate::record::FieldMap;

/// Placeholder interpolation failures.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{template}' has an unbalanced brace at byte {offset}")]
    Unbalanced { template: String, offset: usize },
    #[error("template '{template}' references unresolved placeholder '{placeholder}'")]
    Unresolved {
        template: String,
        placeholder: String,
    },
}

/// An SVG card layout with `{placeholder}` slots.
///
/// `{{` and `}}` escape literal braces. A placeholder name is everything
/// between a single `{` and the next `}`, including spaces and `#`.
#[derive(Debug, Clone)]
pub struct Template {
    pub kind: String,
    pub name: String,
    pub body: String,
}

impl Template {
    pub fn new<K, N, B>(kind: K, name: N, body: B) -> Self
    where
        K: Into<String>,
        N: Into<String>,
        B: Into<String>,
    {
        Self {
            kind: kind.into(),
            name: name.into(),
            body: body.into(),
        }
    }

    /// Collect the distinct placeholder names used by the body.
    pub fn placeholders(&self) -> Result<BTreeSet<String>, TemplateError> {
        let mut names = BTreeSet::new();
        self.walk(|name, _| {
            names.insert(name.to_string());
            Ok(String::new())
        })?;
        Ok(names)
    }

    /// Substitute every placeholder from `fields`.
    ///
    /// Each placeholder must resolve; extra entries in `fields` are ignored.
    pub fn interpolate(&self, fields: &FieldMap) -> Result<String, TemplateError> {
        self.walk(|name, _offset| match fields.get(name) {
            Some(value) => Ok(value.clone()),
            None => Err(TemplateError::Unresolved {
                template: self.name.clone(),
                placeholder: name.to_string(),
            }),
        })
    }

    fn walk<F>(&self, mut visit: F) -> Result<String, TemplateError>
    where
        F: FnMut(&str, usize) -> Result<String, TemplateError>,
    {
        let mut out = String::with_capacity(self.body.len());
        let mut chars = self.body.char_indices().peekable();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        out.push('{');
                        continue;
                    }
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(TemplateError::Unbalanced {
                            template: self.name.clone(),
                            offset,
                        });
                    }
                    out.push_str(&visit(&name, offset)?);
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        out.push('}');
                    } else {
                        return Err(TemplateError::Unbalanced {
                            template: self.name.clone(),
                            offset,
                        });
                    }
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }
}

/// Face templates per entity kind plus the shared generic back.
///
/// Built once and passed by reference into the pipeline; overrides are an
/// explicit load step, never ambient state.
pub struct TemplateRegistry {
    faces: BTreeMap<String, Template>,
    back: Template,
}

impl TemplateRegistry {
    /// Registry holding the built-in layouts.
    pub fn builtin() -> Self {
        let mut faces = BTreeMap::new();
        for kind in EntityKind::ALL {
            let body = match kind {
                EntityKind::Asteroid => ASTEROID_SVG,
                EntityKind::Module => MODULE_SVG,
                EntityKind::Upgrade => UPGRADE_SVG,
                EntityKind::Action => ACTION_SVG,
            };
            faces.insert(
                kind.name().to_string(),
                Template::new(kind.name(), format!("builtin/{}", kind.name()), body),
            );
        }
        Self {
            faces,
            back: Template::new("back", "builtin/back", BACK_SVG),
        }
    }

    /// Face template for an entity kind.
    pub fn face(&self, kind: EntityKind) -> &Template {
        // builtin() seeds every kind and overrides only replace entries.
        &self.faces[kind.name()]
    }

    /// The generic card back template.
    pub fn back(&self) -> &Template {
        &self.back
    }

    /// Every registered template, faces first, back last.
    pub fn list(&self) -> Vec<&Template> {
        let mut all: Vec<&Template> = EntityKind::ALL
            .iter()
            .map(|kind| self.face(*kind))
            .collect();
        all.push(&self.back);
        all
    }

    /// Replace built-ins with `.svg` files from `dir`.
    ///
    /// A file's stem selects the slot it overrides: an entity kind name or
    /// `back`. Other files are ignored. Returns how many slots were replaced.
    pub fn load_overrides(&mut self, dir: &Path) -> Result<usize> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("failed to read template directory {}", dir.display()))?;
        let mut loaded = 0usize;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("svg") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let slot = if stem.eq_ignore_ascii_case("back") {
                Some("back".to_string())
            } else {
                EntityKind::parse(stem).map(|kind| kind.name().to_string())
            };
            let Some(slot) = slot else {
                continue;
            };
            let body = fs::read_to_string(&path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            let template = Template::new(slot.clone(), path.display().to_string(), body);
            if slot == "back" {
                self.back = template;
            } else {
                self.faces.insert(slot, template);
            }
            loaded += 1;
        }
        Ok(loaded)
    }
}

static ASTEROID_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="600" viewBox="0 0 400 600">
  <rect x="0" y="0" width="400" height="600" fill="#10161d"/>
  <rect x="10" y="10" width="380" height="580" rx="22" fill="#1c2733" stroke="#d8a137" stroke-width="6"/>
  <text x="200" y="78" text-anchor="middle" font-family="Georgia, serif" font-size="40" fill="#f2e3c2">{name}</text>
  <line x1="40" y1="104" x2="360" y2="104" stroke="#d8a137" stroke-width="3"/>
  <circle cx="110" cy="300" r="54" fill="#5c6e80" stroke="#0b0f14" stroke-width="4"/>
  <text x="110" y="314" text-anchor="middle" font-family="Georgia, serif" font-size="38" fill="#0b0f14">{r1}</text>
  <circle cx="250" cy="300" r="54" fill="#5c6e80" stroke="#0b0f14" stroke-width="4"/>
  <text x="250" y="314" text-anchor="middle" font-family="Georgia, serif" font-size="38" fill="#0b0f14">{r2}</text>
  <circle cx="180" cy="440" r="54" fill="#5c6e80" stroke="#0b0f14" stroke-width="4"/>
  <text x="180" y="454" text-anchor="middle" font-family="Georgia, serif" font-size="38" fill="#0b0f14">{r3}</text>
</svg>
"##;

static MODULE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="600" viewBox="0 0 400 600">
  <rect x="0" y="0" width="400" height="600" fill="#101a12"/>
  <rect x="10" y="10" width="380" height="580" rx="22" fill="#1b2b1e" stroke="#7fb069" stroke-width="6"/>
  <text x="200" y="64" text-anchor="middle" font-family="Georgia, serif" font-size="30" fill="#e7f2dc">{Rules Text}</text>
  <text x="40" y="130" font-family="Georgia, serif" font-size="22" fill="#cfe3c0">Adjacent: {Adjacent}</text>
  <text x="40" y="164" font-family="Georgia, serif" font-size="22" fill="#cfe3c0">Anywhere: {Anywhere 1} {Anywhere 2}</text>
  <text x="40" y="198" font-family="Georgia, serif" font-size="22" fill="#cfe3c0">Not adjacent: {Not Adjacent}</text>
  <text x="40" y="420" font-family="Georgia, serif" font-size="24" fill="#e7f2dc">Fe {Iron}  Ic {Ice}  Si {Silicate}</text>
  <text x="40" y="458" font-family="Georgia, serif" font-size="24" fill="#e7f2dc">Au {Gold}  U {Uranium}</text>
  <text x="200" y="546" text-anchor="middle" font-family="Georgia, serif" font-size="34" fill="#f2d857">{VP} VP</text>
</svg>
"##;

static UPGRADE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="600" viewBox="0 0 400 600">
  <rect x="0" y="0" width="400" height="600" fill="#1a1020"/>
  <rect x="10" y="10" width="380" height="580" rx="22" fill="#2a1b33" stroke="#b08bd0" stroke-width="6"/>
  <text x="200" y="64" text-anchor="middle" font-family="Georgia, serif" font-size="30" fill="#ead9f7">{Rules Text}</text>
  <text x="40" y="130" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod1}</text>
  <text x="40" y="160" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod2}</text>
  <text x="40" y="190" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod3}</text>
  <text x="40" y="220" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod4}</text>
  <text x="40" y="250" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod5}</text>
  <text x="40" y="280" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod6}</text>
  <text x="40" y="310" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod7}</text>
  <text x="40" y="340" font-family="Georgia, serif" font-size="20" fill="#d7c3e8">{Mod8}</text>
  <text x="40" y="420" font-family="Georgia, serif" font-size="24" fill="#ead9f7">Fe {Iron}  Ic {Ice}  Si {Silicate}</text>
  <text x="40" y="458" font-family="Georgia, serif" font-size="24" fill="#ead9f7">Au {Gold} / {Gold Out}  U {Uranium} / {Uranium Out}</text>
  <text x="200" y="546" text-anchor="middle" font-family="Georgia, serif" font-size="34" fill="#f2d857">{VP} VP</text>
</svg>
"##;

static ACTION_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="600" viewBox="0 0 400 600">
  <rect x="0" y="0" width="400" height="600" fill="#1d140e"/>
  <rect x="10" y="10" width="380" height="580" rx="22" fill="#2e2015" stroke="#d0a05b" stroke-width="6"/>
  <text x="200" y="78" text-anchor="middle" font-family="Georgia, serif" font-size="40" fill="#f5e6cf">{Name}</text>
  <text x="200" y="120" text-anchor="middle" font-family="Georgia, serif" font-size="22" fill="#d0a05b">{Settlement}</text>
  <text x="40" y="220" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#1}</text>
  <text x="40" y="258" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#2}</text>
  <text x="40" y="296" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#3}</text>
  <text x="40" y="334" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#4}</text>
  <text x="40" y="372" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#5}</text>
  <text x="40" y="410" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#6}</text>
  <text x="40" y="448" font-family="Georgia, serif" font-size="24" fill="#f5e6cf">{Rules text#7}</text>
</svg>
"##;

static BACK_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="600" viewBox="0 0 400 600">
  <rect x="0" y="0" width="400" height="600" fill="#0b0f14"/>
  <rect x="18" y="18" width="364" height="564" rx="26" fill="#141c26" stroke="#d8a137" stroke-width="4"/>
  <rect x="34" y="34" width="332" height="532" rx="18" fill="none" stroke="#3c4a5a" stroke-width="2"/>
  <text x="200" y="316" text-anchor="middle" font-family="Georgia, serif" font-size="48" fill="#d8a137">{name}</text>
</svg>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn interpolates_and_ignores_extra_fields() {
        let tpl = Template::new("test", "t", "<text>{name}</text>");
        let out = tpl
            .interpolate(&fields(&[("name", "Vesta"), ("unused", "x")]))
            .unwrap();
        assert_eq!(out, "<text>Vesta</text>");
    }

    #[test]
    fn doubled_braces_escape_literals() {
        let tpl = Template::new("test", "t", "{{literal}} {name} }}");
        let out = tpl.interpolate(&fields(&[("name", "ok")])).unwrap();
        assert_eq!(out, "{literal} ok }");
    }

    #[test]
    fn missing_field_is_an_unresolved_error() {
        let tpl = Template::new("test", "t", "{name} {r1}");
        let err = tpl.interpolate(&fields(&[("name", "Vesta")])).unwrap_err();
        match err {
            TemplateError::Unresolved { placeholder, .. } => assert_eq!(placeholder, "r1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lone_braces_are_unbalanced() {
        let open = Template::new("test", "t", "abc {name");
        assert!(matches!(
            open.placeholders().unwrap_err(),
            TemplateError::Unbalanced { offset: 4, .. }
        ));
        let close = Template::new("test", "t", "abc } def");
        assert!(matches!(
            close.interpolate(&FieldMap::new()).unwrap_err(),
            TemplateError::Unbalanced { offset: 4, .. }
        ));
    }

    #[test]
    fn placeholders_reports_distinct_names() {
        let tpl = Template::new("test", "t", "{a} {b} {a} {{skip}}");
        let names = tpl.placeholders().unwrap();
        let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn builtin_asteroid_face_accepts_mapper_output() {
        let registry = TemplateRegistry::builtin();
        let tpl = registry.face(EntityKind::Asteroid);
        let out = tpl
            .interpolate(&fields(&[
                ("name", "Vesta"),
                ("r1", "Fe"),
                ("r2", "Fe"),
                ("r3", "Ic"),
            ]))
            .unwrap();
        assert!(out.contains(">Vesta<"));
        assert!(out.contains(">Fe<"));
    }

    #[test]
    fn builtin_registry_lists_all_slots() {
        let registry = TemplateRegistry::builtin();
        let kinds: Vec<&str> = registry.list().iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["asteroid", "module", "upgrade", "action", "back"]
        );
    }

    #[test]
    fn overrides_replace_matching_slots_only() {
        let dir = std::env::temp_dir().join(format!("deckpress-tpl-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("asteroid.svg"), "<svg>{name}</svg>").unwrap();
        fs::write(dir.join("back.svg"), "<svg>plain</svg>").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::write(dir.join("mystery.svg"), "ignored").unwrap();

        let mut registry = TemplateRegistry::builtin();
        let loaded = registry.load_overrides(&dir).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(registry.face(EntityKind::Asteroid).body, "<svg>{name}</svg>");
        assert_eq!(registry.back().body, "<svg>plain</svg>");
        assert!(registry.face(EntityKind::Module).body.contains("{Rules Text}"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
