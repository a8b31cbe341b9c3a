//! Document font selection and embedding
//!
//! One font is embedded per flatten operation. It is chosen by scanning the
//! rendered value of every field for CJK characters: if any field needs CJK
//! glyphs the (subsetted) CJK font is used, otherwise the default Unicode
//! font is embedded in full.

pub mod cmap;
pub mod embed;
pub mod source;

pub use embed::{EmbedOptions, EmbeddedFont, FontEmbedder, Glyph, TrueTypeEmbedder};
pub use source::{DefaultFontSource, FileFontSource, FontSource, HttpFontSource};

use crate::config::FlattenConfig;
use crate::error::{FieldFailure, FlattenError};
use crate::form::{choice_options, Field, FieldKind, Form};
use crate::objects::{dict_by_id, get_resolved, get_text};
use crate::report::FlattenObserver;
use lopdf::Document;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Unified ideographs, extensions A through H.
const CJK_RANGES: [(u32, u32); 8] = [
    (0x4E00, 0x9FFF),
    (0x3400, 0x4DBF),
    (0x20000, 0x2A6DF),
    (0x2A700, 0x2B73F),
    (0x2B740, 0x2B81F),
    (0x2B820, 0x2CEAF),
    (0x2CEB0, 0x2EBEF),
    (0x30000, 0x3134F),
];

pub fn is_cjk(ch: char) -> bool {
    let cp = ch as u32;
    CJK_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// True iff `text` contains at least one CJK ideograph.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontChoice {
    Default,
    Cjk,
}

impl FontChoice {
    /// CJK programs are large, so only the needed glyphs are embedded.
    pub fn embed_options(self) -> EmbedOptions {
        EmbedOptions {
            subset: matches!(self, FontChoice::Cjk),
        }
    }
}

/// Decide which font the document needs. Fields whose value cannot be read
/// are reported and count as non-matching; scanning stops at the first match.
pub fn choose_font(doc: &Document, form: &Form, observer: &mut dyn FlattenObserver) -> FontChoice {
    for field in form.fields() {
        match field.text_value(doc) {
            Ok(text) if contains_cjk(&text) => return FontChoice::Cjk,
            Ok(_) => {}
            Err(detail) => {
                warn!("Could not read value of field '{}': {}", field.name, detail);
                observer.field_failed(&FieldFailure::ValueUnreadable {
                    field: field.name.clone(),
                    detail,
                });
            }
        }
    }
    FontChoice::Default
}

/// Every character appearance regeneration may draw for `field`.
fn field_text(doc: &Document, field: &Field) -> String {
    let mut text = field.text_value(doc).unwrap_or_default();
    match field.kind {
        FieldKind::ComboBox | FieldKind::ListBox => {
            for option in choice_options(doc, field) {
                text.push_str(&option.display);
            }
        }
        FieldKind::PushButton => {
            for widget in &field.widgets {
                let caption = dict_by_id(doc, *widget)
                    .and_then(|w| get_resolved(doc, w, b"MK"))
                    .and_then(|mk| mk.as_dict().ok())
                    .and_then(|mk| get_text(doc, mk, b"CA"));
                if let Some(caption) = caption {
                    text.push_str(&caption);
                }
            }
        }
        _ => {}
    }
    text
}

/// The distinct characters drawn by appearance regeneration, in code point order.
pub fn drawable_text(doc: &Document, form: &Form) -> String {
    let chars: BTreeSet<char> = form
        .fields()
        .iter()
        .flat_map(|field| field_text(doc, field).chars().collect::<Vec<_>>())
        .collect();
    chars.into_iter().collect()
}

/// Selects, fetches and embeds the document font.
pub struct FontResolver<'a> {
    source: &'a dyn FontSource,
    embedder: &'a dyn FontEmbedder,
    config: &'a FlattenConfig,
}

impl<'a> FontResolver<'a> {
    pub fn new(
        source: &'a dyn FontSource,
        embedder: &'a dyn FontEmbedder,
        config: &'a FlattenConfig,
    ) -> Self {
        Self {
            source,
            embedder,
            config,
        }
    }

    pub fn location(&self, choice: FontChoice) -> String {
        match choice {
            FontChoice::Default => self.config.default_font_location(),
            FontChoice::Cjk => self.config.cjk_font_location(),
        }
    }

    /// Choose, fetch and embed the font. Fetch or embed failures are fatal.
    pub async fn resolve(
        &self,
        doc: &mut Document,
        form: &Form,
        observer: &mut dyn FlattenObserver,
    ) -> Result<(FontChoice, EmbeddedFont), FlattenError> {
        let choice = choose_font(doc, form, observer);
        let location = self.location(choice);
        info!("Using {:?} font from {}", choice, location);

        let bytes = self.source.fetch(&location).await?;
        let glyphs = drawable_text(doc, form);
        let font = self
            .embedder
            .embed(doc, &bytes, choice.embed_options(), &glyphs)?;
        observer.font_selected(choice, &location);
        Ok((choice, font))
    }
}
