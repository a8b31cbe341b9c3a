//! AcroForm model: field discovery, kinds and removal

pub mod value;

pub use value::{choice_options, read_value, ChoiceOption, FieldValue};

use crate::error::FlattenError;
use crate::objects::{dict_by_id, get_text, reference_array, remove_references, resolve, MAX_DEPTH};
use crate::pages;
use lopdf::{Document, Object, ObjectId};
use std::collections::HashSet;
use tracing::debug;

/// Field flag bits (`/Ff`), zero-based.
pub const FLAG_MULTILINE: i64 = 1 << 12;
pub const FLAG_RADIO: i64 = 1 << 15;
pub const FLAG_PUSHBUTTON: i64 = 1 << 16;
pub const FLAG_COMBO: i64 = 1 << 17;
pub const FLAG_MULTI_SELECT: i64 = 1 << 21;
pub const FLAG_COMB: i64 = 1 << 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Text,
    CheckBox,
    RadioGroup,
    ComboBox,
    ListBox,
    PushButton,
    Signature,
}

impl FieldKind {
    /// Derive the kind from a field type name and its flags.
    pub fn from_type(field_type: &[u8], flags: i64) -> Option<Self> {
        match field_type {
            b"Tx" => Some(FieldKind::Text),
            b"Btn" if flags & FLAG_PUSHBUTTON != 0 => Some(FieldKind::PushButton),
            b"Btn" if flags & FLAG_RADIO != 0 => Some(FieldKind::RadioGroup),
            b"Btn" => Some(FieldKind::CheckBox),
            b"Ch" if flags & FLAG_COMBO != 0 => Some(FieldKind::ComboBox),
            b"Ch" => Some(FieldKind::ListBox),
            b"Sig" => Some(FieldKind::Signature),
            _ => None,
        }
    }

    /// CheckBox and RadioGroup pick their appearance by state key.
    pub fn is_two_state(self) -> bool {
        matches!(self, FieldKind::CheckBox | FieldKind::RadioGroup)
    }
}

/// A terminal form field and the widgets that display it.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: ObjectId,
    /// Fully qualified name (partial names joined with `.`).
    pub name: String,
    pub kind: FieldKind,
    pub widgets: Vec<ObjectId>,
    pub parent: Option<ObjectId>,
}

impl Field {
    /// Field flags, inherited through `/Parent`.
    pub fn flags(&self, doc: &Document) -> i64 {
        inherited(doc, self.id, b"Ff")
            .and_then(|obj| match obj {
                Object::Integer(i) => Some(*i),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn value(&self, doc: &Document) -> Result<FieldValue, String> {
        read_value(doc, self)
    }

    /// The text this field renders, used for script detection.
    pub fn text_value(&self, doc: &Document) -> Result<String, String> {
        Ok(self.value(doc)?.display_text())
    }

    /// State key matching the current value of a two-state field.
    ///
    /// `None` for other kinds and for fields that are off or unset; the
    /// caller falls back to `Off`.
    pub fn appearance_key(&self, doc: &Document) -> Option<Vec<u8>> {
        if !self.kind.is_two_state() {
            return None;
        }
        match inherited(doc, self.id, b"V")? {
            Object::Name(name) if name.as_slice() != b"Off" => Some(name.clone()),
            _ => None,
        }
    }
}

/// Look up an inheritable field attribute, walking `/Parent` links.
pub fn inherited<'a>(doc: &'a Document, id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = dict_by_id(doc, id)?;
    for _ in 0..MAX_DEPTH {
        if let Ok(obj) = current.get(key) {
            return resolve(doc, obj).ok();
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = dict_by_id(doc, parent)?;
    }
    None
}

/// The interactive form of a document.
#[derive(Debug, Clone, Default)]
pub struct Form {
    acroform: Option<ObjectId>,
    fields: Vec<Field>,
}

impl Form {
    /// Discover the form of `doc`.
    ///
    /// An inline `/AcroForm` dictionary is moved into its own object so the
    /// field list can be edited in place later.
    pub fn load(doc: &mut Document) -> Result<Self, FlattenError> {
        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(|root| root.as_reference())
            .map_err(|_| FlattenError::ParseError("Trailer has no /Root reference".into()))?;

        let acroform = match doc.get_dictionary(catalog_id)?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(dict)) => {
                let dict = dict.clone();
                let id = doc.add_object(dict);
                doc.get_dictionary_mut(catalog_id)?
                    .set("AcroForm", Object::Reference(id));
                Some(id)
            }
            _ => None,
        };

        let fields = match acroform {
            Some(id) => discover_fields(doc, id),
            None => Vec::new(),
        };
        debug!("Discovered {} form fields", fields.len());
        Ok(Self { acroform, fields })
    }

    pub fn acroform_id(&self) -> Option<ObjectId> {
        self.acroform
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Detach a field: drop its widgets from page annotations, unlink it
    /// from its parent (or the root field list), delete its objects and prune
    /// ancestors left without kids.
    pub fn remove_field(&mut self, doc: &mut Document, field: &Field) -> Result<(), String> {
        let mut annotation_ids = field.widgets.clone();
        if !annotation_ids.contains(&field.id) {
            annotation_ids.push(field.id);
        }
        for page_id in pages::page_ids(doc) {
            pages::remove_annotations(doc, page_id, &annotation_ids)?;
        }

        self.unlink(doc, field.id, field.parent)?;
        for id in &annotation_ids {
            doc.objects.remove(id);
        }

        let mut ancestor = field.parent;
        let mut depth = 0;
        while let Some(node) = ancestor {
            depth += 1;
            if depth > MAX_DEPTH {
                break;
            }
            let kids_left = dict_by_id(doc, node)
                .and_then(|dict| dict.get(b"Kids").ok())
                .map(|kids| reference_array(doc, kids).len())
                .unwrap_or(0);
            if kids_left > 0 {
                break;
            }
            let grandparent = dict_by_id(doc, node)
                .and_then(|dict| dict.get(b"Parent").ok())
                .and_then(|p| p.as_reference().ok());
            self.unlink(doc, node, grandparent)?;
            doc.objects.remove(&node);
            ancestor = grandparent;
        }

        self.fields.retain(|f| f.id != field.id);
        Ok(())
    }

    fn unlink(&self, doc: &mut Document, id: ObjectId, parent: Option<ObjectId>) -> Result<(), String> {
        let removed = match parent {
            Some(parent_id) => remove_references(doc, parent_id, b"Kids", &[id])?,
            None => match self.acroform {
                Some(acroform_id) => remove_references(doc, acroform_id, b"Fields", &[id])?,
                None => 0,
            },
        };
        if removed == 0 {
            return Err(format!("Object {} {} R is not listed by its parent", id.0, id.1));
        }
        Ok(())
    }
}

fn discover_fields(doc: &Document, acroform_id: ObjectId) -> Vec<Field> {
    let roots = dict_by_id(doc, acroform_id)
        .and_then(|dict| dict.get(b"Fields").ok())
        .map(|fields| reference_array(doc, fields))
        .unwrap_or_default();

    let mut fields = Vec::new();
    let mut visited = HashSet::new();
    for root in roots {
        visit(doc, root, None, "", 0, &mut visited, &mut fields);
    }
    fields
}

fn visit(
    doc: &Document,
    id: ObjectId,
    parent: Option<ObjectId>,
    prefix: &str,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<Field>,
) {
    if depth > MAX_DEPTH || !visited.insert(id) {
        return;
    }
    let Some(dict) = dict_by_id(doc, id) else {
        debug!("Field {:?} is not a dictionary", id);
        return;
    };

    let partial = get_text(doc, dict, b"T");
    let name = match (&partial, prefix.is_empty()) {
        (Some(t), true) => t.clone(),
        (Some(t), false) => format!("{}.{}", prefix, t),
        (None, _) => prefix.to_string(),
    };

    let kids = dict
        .get(b"Kids")
        .map(|kids| reference_array(doc, kids))
        .unwrap_or_default();
    let (child_fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) = kids.into_iter().partition(|kid| {
        dict_by_id(doc, *kid).map(|k| k.has(b"T")).unwrap_or(false)
    });

    if !child_fields.is_empty() {
        for child in child_fields {
            visit(doc, child, Some(id), &name, depth + 1, visited, out);
        }
        return;
    }

    let field_type = match inherited(doc, id, b"FT") {
        Some(Object::Name(ft)) => ft.clone(),
        _ => {
            debug!("Field '{}' has no field type, ignoring", name);
            return;
        }
    };
    let flags = match inherited(doc, id, b"Ff") {
        Some(Object::Integer(i)) => *i,
        _ => 0,
    };
    let Some(kind) = FieldKind::from_type(&field_type, flags) else {
        debug!("Field '{}' has unknown type {:?}", name, String::from_utf8_lossy(&field_type));
        return;
    };

    let widgets = if widgets.is_empty() { vec![id] } else { widgets };
    out.push(Field {
        id,
        name,
        kind,
        widgets,
        parent,
    });
}
