//! Default appearance (`/DA`) strings

use crate::form::inherited;
use crate::objects::{decode_text_string, dict_by_id, get_text, resolve};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
}

impl Color {
    pub const BLACK: Color = Color::Gray(0.0);

    fn components(&self) -> Vec<Object> {
        let values = match *self {
            Color::Gray(g) => vec![g],
            Color::Rgb(r, g, b) => vec![r, g, b],
            Color::Cmyk(c, m, y, k) => vec![c, m, y, k],
        };
        values.into_iter().map(|v| Object::Real(v as f32)).collect()
    }

    pub fn fill(&self) -> Operation {
        let operator = match self {
            Color::Gray(_) => "g",
            Color::Rgb(..) => "rg",
            Color::Cmyk(..) => "k",
        };
        Operation::new(operator, self.components())
    }

    pub fn stroke(&self) -> Operation {
        let operator = match self {
            Color::Gray(_) => "G",
            Color::Rgb(..) => "RG",
            Color::Cmyk(..) => "K",
        };
        Operation::new(operator, self.components())
    }

    /// Read an `/MK` colour array (1, 3 or 4 components; empty means none).
    pub fn from_array(doc: &Document, obj: &Object) -> Option<Color> {
        let items = match resolve(doc, obj).ok()? {
            Object::Array(items) => items,
            _ => return None,
        };
        let values: Vec<f64> = items.iter().filter_map(|o| number(doc, o)).collect();
        match values.as_slice() {
            [g] => Some(Color::Gray(*g)),
            [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
            [c, m, y, k] => Some(Color::Cmyk(*c, *m, *y, *k)),
            _ => None,
        }
    }
}

fn literal_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    literal_number(resolve(doc, obj).ok()?)
}

/// Font size and colour from a `/DA` string. A size of zero means auto.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppearance {
    pub font_name: Option<Vec<u8>>,
    pub font_size: f64,
    pub color: Color,
}

impl Default for DefaultAppearance {
    fn default() -> Self {
        Self {
            font_name: None,
            font_size: 0.0,
            color: Color::BLACK,
        }
    }
}

impl DefaultAppearance {
    pub fn is_auto_size(&self) -> bool {
        self.font_size <= 0.0
    }

    /// Parse a DA string; the last `Tf` and the last colour operator win.
    /// Unparseable input yields the defaults.
    pub fn parse(da: &[u8]) -> Self {
        let mut result = Self::default();
        let Ok(content) = Content::decode(da) else {
            return result;
        };
        for operation in &content.operations {
            let operands: Vec<f64> = operation
                .operands
                .iter()
                .filter_map(literal_number)
                .collect();
            match (operation.operator.as_str(), operands.as_slice()) {
                ("Tf", [size]) => {
                    result.font_size = *size;
                    result.font_name = operation
                        .operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .map(|name| name.to_vec());
                }
                ("g", [g]) => result.color = Color::Gray(*g),
                ("rg", [r, g, b]) => result.color = Color::Rgb(*r, *g, *b),
                ("k", [c, m, y, k]) => result.color = Color::Cmyk(*c, *m, *y, *k),
                _ => {}
            }
        }
        result
    }
}

/// Resolve the DA for a widget: its own entry, then the field's (inherited),
/// then the AcroForm default.
pub fn widget_da(doc: &Document, acroform: Option<ObjectId>, field: ObjectId, widget: ObjectId) -> DefaultAppearance {
    let own = dict_by_id(doc, widget).and_then(|w| get_text(doc, w, b"DA"));
    let from_field = || match inherited(doc, field, b"DA") {
        Some(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
        _ => None,
    };
    let from_form = || acroform.and_then(|id| dict_by_id(doc, id)).and_then(|f| get_text(doc, f, b"DA"));

    own.or_else(from_field)
        .or_else(from_form)
        .map(|da| DefaultAppearance::parse(da.as_bytes()))
        .unwrap_or_default()
}
