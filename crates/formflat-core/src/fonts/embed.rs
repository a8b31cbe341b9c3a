//! Font embedding
//!
//! [`TrueTypeEmbedder`] writes a Type0 composite font (CIDFontType2,
//! Identity-H) so any glyph of the program can be addressed with a two-byte
//! code. When subsetting is requested the program is cut down to the glyphs
//! the regenerated appearances need.

use super::cmap::to_unicode_cmap;
use crate::error::FlattenError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};
use ttf_parser::{Face, GlyphId, PlatformId};

/// Encoded code and advance width (1/1000 em) of one character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub code: u16,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbedOptions {
    pub subset: bool,
}

/// A font that has been written into the document, with the metrics needed
/// to lay out text in it.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub font_id: ObjectId,
    pub base_font: String,
    ascent: f64,
    descent: f64,
    two_byte: bool,
    missing_width: f64,
    glyphs: HashMap<char, Glyph>,
}

impl EmbeddedFont {
    /// `ascent` and `descent` are in 1/1000 em, descent negative.
    pub fn new(
        font_id: ObjectId,
        base_font: impl Into<String>,
        ascent: f64,
        descent: f64,
        two_byte: bool,
    ) -> Self {
        Self {
            font_id,
            base_font: base_font.into(),
            ascent,
            descent,
            two_byte,
            missing_width: 0.0,
            glyphs: HashMap::new(),
        }
    }

    pub fn insert_glyph(&mut self, ch: char, glyph: Glyph) {
        self.glyphs.insert(ch, glyph);
    }

    pub fn with_glyph(mut self, ch: char, glyph: Glyph) -> Self {
        self.insert_glyph(ch, glyph);
        self
    }

    pub fn glyph(&self, ch: char) -> Option<Glyph> {
        self.glyphs.get(&ch).copied()
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Encode text for a `Tj` operand. Unmapped characters use code 0.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            let code = self.glyph(ch).map(|g| g.code).unwrap_or(0);
            if self.two_byte {
                out.extend_from_slice(&code.to_be_bytes());
            } else {
                out.push(code as u8);
            }
        }
        out
    }

    /// Advance width of `text` at `size`, in text space units.
    pub fn width_of(&self, text: &str, size: f64) -> f64 {
        let units: f64 = text
            .chars()
            .map(|ch| self.glyph(ch).map(|g| g.width).unwrap_or(self.missing_width))
            .sum();
        units * size / 1000.0
    }

    pub fn ascent_at_size(&self, size: f64) -> f64 {
        self.ascent * size / 1000.0
    }

    pub fn descent_at_size(&self, size: f64) -> f64 {
        self.descent * size / 1000.0
    }

    pub fn height_at_size(&self, size: f64) -> f64 {
        (self.ascent - self.descent) * size / 1000.0
    }

    /// Largest size whose line height fits in `height`.
    pub fn size_for_height(&self, height: f64) -> f64 {
        let units = self.ascent - self.descent;
        if units <= 0.0 {
            return height;
        }
        height * 1000.0 / units
    }
}

/// Writes a font program into a document.
pub trait FontEmbedder: Send + Sync {
    /// Embed `bytes`; `text` holds every character that will be drawn.
    fn embed(
        &self,
        doc: &mut Document,
        bytes: &[u8],
        options: EmbedOptions,
        text: &str,
    ) -> Result<EmbeddedFont, FlattenError>;
}

/// Embeds TrueType/OpenType programs as Type0 fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueTypeEmbedder;

impl TrueTypeEmbedder {
    pub fn new() -> Self {
        Self
    }
}

/// PostScript name from the `name` table. Unicode records are preferred;
/// Macintosh Roman records are read for their ASCII range, which covers
/// every character allowed in a PostScript name.
fn postscript_name(face: &Face<'_>) -> Option<String> {
    let records: Vec<_> = face
        .names()
        .into_iter()
        .filter(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
        .collect();
    let unicode = records.iter().find_map(|name| name.to_string());
    let roman = || {
        records
            .iter()
            .find(|name| name.platform_id == PlatformId::Macintosh && name.encoding_id == 0)
            .map(|name| name.name.iter().filter(|b| b.is_ascii()).map(|&b| b as char).collect::<String>())
    };
    unicode
        .or_else(roman)
        .map(|name| sanitize_font_name(&name))
        .filter(|name| !name.is_empty())
}

fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%".contains(*c))
        .collect()
}

/// Six-letter subset tag derived from the glyph set.
fn subset_tag(glyphs: &[u16]) -> String {
    let mut hash: u32 = 2166136261;
    for gid in glyphs {
        for byte in gid.to_be_bytes() {
            hash ^= byte as u32;
            hash = hash.wrapping_mul(16777619);
        }
    }
    (0..6)
        .map(|i| (b'A' + ((hash >> (i * 5)) % 26) as u8) as char)
        .collect()
}

/// Cut the program down to `glyphs` (plus `.notdef`). Returns the new
/// program and old-to-new glyph id mapping.
fn subset_program(bytes: &[u8], glyphs: &[u16]) -> Result<(Vec<u8>, HashMap<u16, u16>), String> {
    use allsorts::binary::read::ReadScope;
    use allsorts::font_data::FontData;
    use allsorts::subset::{CmapTarget, SubsetProfile};

    let mut ids: Vec<u16> = glyphs.iter().copied().filter(|&gid| gid != 0).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.insert(0, 0);

    let scope = ReadScope::new(bytes);
    let font_file = scope.read::<FontData<'_>>().map_err(|e| e.to_string())?;
    let provider = font_file.table_provider(0).map_err(|e| e.to_string())?;
    let program = allsorts::subset::subset(&provider, &ids, &SubsetProfile::Pdf, CmapTarget::Unicode)
        .map_err(|e| e.to_string())?;

    // New glyph ids follow the order of the requested ids
    let mapping = ids
        .iter()
        .enumerate()
        .map(|(new, &old)| (old, new as u16))
        .collect();
    Ok((program, mapping))
}

/// `W` array: `[first [w1 w2 ...] ...]` over runs of consecutive codes.
fn widths_array(widths: &BTreeMap<u16, f64>) -> Object {
    let mut result = Vec::new();
    let mut run: Vec<Object> = Vec::new();
    let mut run_start = 0u16;
    let mut previous: Option<u16> = None;

    for (&code, &width) in widths {
        match previous {
            Some(prev) if code == prev.wrapping_add(1) && code != 0 => {}
            Some(_) => {
                result.push(Object::Integer(run_start as i64));
                result.push(Object::Array(std::mem::take(&mut run)));
                run_start = code;
            }
            None => run_start = code,
        }
        run.push(Object::Integer(width.round() as i64));
        previous = Some(code);
    }
    if !run.is_empty() {
        result.push(Object::Integer(run_start as i64));
        result.push(Object::Array(run));
    }
    Object::Array(result)
}

impl FontEmbedder for TrueTypeEmbedder {
    fn embed(
        &self,
        doc: &mut Document,
        bytes: &[u8],
        options: EmbedOptions,
        text: &str,
    ) -> Result<EmbeddedFont, FlattenError> {
        let face = Face::parse(bytes, 0)
            .map_err(|e| FlattenError::FontEmbed(format!("Failed to parse font: {}", e)))?;
        let scale = 1000.0 / face.units_per_em() as f64;

        let mut chars: BTreeSet<char> = text.chars().filter(|c| !c.is_control()).collect();
        chars.insert(' ');
        if !options.subset {
            chars.extend((0x20u8..=0x7E).map(char::from));
        }

        let mapped: Vec<(char, GlyphId)> = chars
            .iter()
            .filter_map(|&ch| face.glyph_index(ch).map(|gid| (ch, gid)))
            .collect();
        let missing = chars.len() - mapped.len();
        if missing > 0 {
            debug!("{} characters have no glyph in the font", missing);
        }

        let advance = |gid: GlyphId| face.glyph_hor_advance(gid).unwrap_or(0) as f64 * scale;
        let original_gids: Vec<u16> = mapped.iter().map(|(_, gid)| gid.0).collect();

        let subset = if options.subset {
            match subset_program(bytes, &original_gids) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!("Font subsetting failed, embedding full program: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut base_font = postscript_name(&face).unwrap_or_else(|| "EmbeddedFont".to_string());
        let (program, code_of): (Vec<u8>, Box<dyn Fn(u16) -> u16>) = match subset {
            Some((program, mapping)) => {
                base_font = format!("{}+{}", subset_tag(&original_gids), base_font);
                (program, Box::new(move |gid| mapping.get(&gid).copied().unwrap_or(0)))
            }
            None => (bytes.to_vec(), Box::new(|gid| gid)),
        };

        let ascent = face.ascender() as f64 * scale;
        let descent = face.descender() as f64 * scale;
        let missing_width = advance(GlyphId(0));
        let mut font = EmbeddedFont::new((0, 0), base_font.clone(), ascent, descent, true);
        font.missing_width = missing_width;

        let mut widths = BTreeMap::new();
        let mut unicode = Vec::with_capacity(mapped.len());
        for &(ch, gid) in &mapped {
            let code = code_of(gid.0);
            let width = advance(gid);
            font.insert_glyph(ch, Glyph { code, width });
            widths.insert(code, width);
            unicode.push((code, ch));
        }
        widths.insert(0, missing_width);

        let bbox = face.global_bounding_box();
        let program_len = program.len();
        let font_file_id = doc.add_object(Stream::new(
            Dictionary::from_iter(vec![("Length1", Object::Integer(program_len as i64))]),
            program,
        ));

        let mut flags = 1 << 5;
        if face.is_monospaced() {
            flags |= 1;
        }
        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", Object::Name(base_font.clone().into_bytes())),
            ("Flags", Object::Integer(flags)),
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer((bbox.x_min as f64 * scale) as i64),
                    Object::Integer((bbox.y_min as f64 * scale) as i64),
                    Object::Integer((bbox.x_max as f64 * scale) as i64),
                    Object::Integer((bbox.y_max as f64 * scale) as i64),
                ]),
            ),
            ("ItalicAngle", Object::Real(face.italic_angle().unwrap_or(0.0))),
            ("Ascent", Object::Integer(ascent as i64)),
            ("Descent", Object::Integer(descent as i64)),
            (
                "CapHeight",
                Object::Integer((face.capital_height().unwrap_or(face.ascender()) as f64 * scale) as i64),
            ),
            ("StemV", Object::Integer(if face.is_bold() { 140 } else { 80 })),
            ("FontFile2", Object::Reference(font_file_id)),
        ]));

        let cid_font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("BaseFont", Object::Name(base_font.clone().into_bytes())),
            (
                "CIDSystemInfo",
                Object::Dictionary(Dictionary::from_iter(vec![
                    ("Registry", Object::String(b"Adobe".to_vec(), StringFormat::Literal)),
                    ("Ordering", Object::String(b"Identity".to_vec(), StringFormat::Literal)),
                    ("Supplement", Object::Integer(0)),
                ])),
            ),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("DW", Object::Integer(missing_width.round() as i64)),
            ("W", widths_array(&widths)),
            ("CIDToGIDMap", Object::Name(b"Identity".to_vec())),
        ]));

        let to_unicode_id = doc.add_object(Stream::new(
            Dictionary::new(),
            to_unicode_cmap(&unicode).into_bytes(),
        ));

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("BaseFont", Object::Name(base_font.clone().into_bytes())),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
            ("DescendantFonts", Object::Array(vec![Object::Reference(cid_font_id)])),
            ("ToUnicode", Object::Reference(to_unicode_id)),
        ]));
        font.font_id = font_id;

        info!(
            "Embedded font {} ({} glyphs, {} bytes)",
            base_font,
            mapped.len(),
            program_len
        );
        Ok(font)
    }
}
