//! Object-graph helpers over lopdf
//!
//! Everything here is tolerant: lookups return `Option`/`Result<_, String>`
//! so callers can turn a malformed entry into a skip reason instead of
//! aborting the document.

use lopdf::{Dictionary, Document, Object, ObjectId};

/// Maximum number of reference hops or parent links followed before giving up.
pub const MAX_DEPTH: usize = 32;

/// Follow references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, String> {
    let mut current = obj;
    for _ in 0..MAX_DEPTH {
        match current {
            Object::Reference(id) => {
                current = doc
                    .objects
                    .get(id)
                    .ok_or_else(|| format!("Object {} {} R not found", id.0, id.1))?;
            }
            _ => return Ok(current),
        }
    }
    Err("Reference chain too deep".to_string())
}

/// Resolve an object to a dictionary, looking through stream dictionaries.
pub fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj).ok()? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Fetch an indirect object as a dictionary.
pub fn dict_by_id(doc: &Document, id: ObjectId) -> Option<&Dictionary> {
    doc.objects.get(&id).and_then(|obj| resolve_dict(doc, obj))
}

/// Fetch a dictionary entry, following references.
pub fn get_resolved<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(doc, obj).ok())
}

/// Read an integer entry.
pub fn get_integer(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match get_resolved(doc, dict, key)? {
        Object::Integer(i) => Some(*i),
        Object::Real(r) => Some(*r as i64),
        _ => None,
    }
}

/// Read a text string entry and decode it.
pub fn get_text(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match get_resolved(doc, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Extract a number from a PDF object
pub fn extract_number(doc: &Document, obj: &Object) -> Result<f64, String> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(*r as f64),
        other => Err(format!("Expected number, found {:?}", other)),
    }
}

/// A rectangle in page space: lower-left origin plus extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Parse a PDF rectangle array `[x1 y1 x2 y2]` into a normalised [`Rect`].
pub fn parse_rect(doc: &Document, obj: &Object) -> Result<Rect, String> {
    let arr = match resolve(doc, obj)? {
        Object::Array(a) => a,
        _ => return Err("Rect is not an array".to_string()),
    };

    if arr.len() != 4 {
        return Err(format!("Rect has {} elements, expected 4", arr.len()));
    }

    let mut values = [0.0f64; 4];
    for (i, obj) in arr.iter().enumerate() {
        values[i] = extract_number(doc, obj)?;
    }

    let (x1, y1, x2, y2) = (values[0], values[1], values[2], values[3]);
    Ok(Rect {
        x: x1.min(x2),
        y: y1.min(y2),
        width: (x2 - x1).abs(),
        height: (y2 - y1).abs(),
    })
}

/// Collect references from an array entry that may itself be indirect.
pub fn reference_array(doc: &Document, obj: &Object) -> Vec<ObjectId> {
    match resolve(doc, obj) {
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Drop references to any of `targets` from the array stored under `key` in
/// the dictionary `owner`. The array may be inline or indirect; a missing
/// entry removes nothing.
pub fn remove_references(
    doc: &mut Document,
    owner: ObjectId,
    key: &[u8],
    targets: &[ObjectId],
) -> Result<usize, String> {
    let indirect = match dict_by_id(doc, owner) {
        Some(dict) => match dict.get(key) {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(_) => None,
            Err(_) => return Ok(0),
        },
        None => return Err(format!("Object {} {} R is not a dictionary", owner.0, owner.1)),
    };

    let array = match indirect {
        Some(id) => doc
            .get_object_mut(id)
            .map_err(|e| format!("Failed to get array object: {}", e))?,
        None => doc
            .get_object_mut(owner)
            .map_err(|e| format!("Failed to get object: {}", e))?
            .as_dict_mut()
            .map_err(|_| "Owner is not a dictionary".to_string())?
            .get_mut(key)
            .map_err(|e| format!("Failed to get entry: {}", e))?,
    };
    let items = array
        .as_array_mut()
        .map_err(|_| format!("/{} is not an array", String::from_utf8_lossy(key)))?;

    let before = items.len();
    items.retain(|item| match item {
        Object::Reference(id) => !targets.contains(id),
        _ => true,
    });
    Ok(before - items.len())
}

/// PDFDocEncoding code points for bytes 0x80..=0xA0 that differ from Latin-1.
const PDF_DOC_HIGH: [char; 33] = [
    '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
    '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
    '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
    '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}', '\u{FFFD}',
    '\u{20AC}',
];

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or PDFDocEncoding).
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return char::decode_utf16(units)
            .map(|r| r.unwrap_or('\u{FFFD}'))
            .collect();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0xA0 => PDF_DOC_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_rect_array() {
        let doc = Document::new();
        let arr = Object::Array(vec![
            Object::Integer(100),
            Object::Integer(200),
            Object::Integer(120),
            Object::Integer(220),
        ]);
        let rect = parse_rect(&doc, &arr).unwrap();
        assert_eq!(rect, Rect::new(100.0, 200.0, 20.0, 20.0));
    }

    #[test]
    fn test_parse_rect_normalises_inverted_corners() {
        let doc = Document::new();
        let arr = Object::Array(vec![
            Object::Real(120.0),
            Object::Real(220.0),
            Object::Real(100.0),
            Object::Real(200.0),
        ]);
        let rect = parse_rect(&doc, &arr).unwrap();
        assert_eq!(rect, Rect::new(100.0, 200.0, 20.0, 20.0));
    }

    #[test]
    fn test_parse_rect_rejects_short_array() {
        let doc = Document::new();
        let arr = Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(1)]);
        let err = parse_rect(&doc, &arr).unwrap_err();
        assert!(err.contains("3 elements"), "got: {err}");
    }

    #[test]
    fn test_parse_rect_follows_reference() {
        let mut doc = Document::new();
        let id = doc.add_object(Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]));
        let rect = parse_rect(&doc, &Object::Reference(id)).unwrap();
        assert_eq!(rect.width, 612.0);
        assert_eq!(rect.height, 792.0);
    }

    #[test]
    fn test_resolve_missing_reference_is_error() {
        let doc = Document::new();
        assert!(resolve(&doc, &Object::Reference((99, 0))).is_err());
    }

    #[test]
    fn test_decode_utf16_text_string() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "中文 ok".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text_string(&bytes), "中文 ok");
    }

    #[test]
    fn test_decode_pdfdoc_text_string() {
        assert_eq!(decode_text_string(b"Caf\xe9"), "Café");
        assert_eq!(decode_text_string(b"\x80 item"), "\u{2022} item");
    }
}
