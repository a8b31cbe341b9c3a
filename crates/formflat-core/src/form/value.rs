//! Reading field values

use super::{inherited, Field, FieldKind};
use crate::objects::{decode_text_string, resolve};
use lopdf::{Document, Object};

/// The current value of a field, shaped by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Selected export values of a choice field or radio group.
    Selected(Vec<String>),
    Checked(bool),
    Empty,
}

impl FieldValue {
    /// The text a field of this value renders: selections joined with a
    /// space, a checked box as `checked`.
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Selected(values) => values.join(" "),
            FieldValue::Checked(true) => "checked".to_string(),
            FieldValue::Checked(false) | FieldValue::Empty => String::new(),
        }
    }
}

/// One entry of a choice field's `/Opt` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOption {
    pub export: String,
    pub display: String,
}

fn string_of(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Read the current value of `field`.
///
/// Errors when `/V` holds an object that cannot be a value for the kind.
pub fn read_value(doc: &Document, field: &Field) -> Result<FieldValue, String> {
    let value = inherited(doc, field.id, b"V");
    match field.kind {
        FieldKind::Text => match value {
            None | Some(Object::Null) => Ok(FieldValue::Text(String::new())),
            Some(obj @ Object::String(..)) => Ok(FieldValue::Text(string_of(obj).unwrap_or_default())),
            Some(Object::Stream(stream)) => {
                let bytes = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                Ok(FieldValue::Text(decode_text_string(&bytes)))
            }
            Some(other) => Err(format!("Text value has unexpected type: {:?}", other)),
        },
        FieldKind::ComboBox | FieldKind::ListBox => match value {
            None | Some(Object::Null) => Ok(FieldValue::Selected(Vec::new())),
            Some(Object::Array(items)) => items
                .iter()
                .map(|item| {
                    resolve(doc, item)
                        .ok()
                        .and_then(string_of)
                        .ok_or_else(|| format!("Choice entry has unexpected type: {:?}", item))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Selected),
            Some(obj) => string_of(obj)
                .map(|s| FieldValue::Selected(vec![s]))
                .ok_or_else(|| format!("Choice value has unexpected type: {:?}", obj)),
        },
        FieldKind::RadioGroup => match value {
            Some(Object::Name(name)) if name.as_slice() != b"Off" => Ok(FieldValue::Selected(vec![
                String::from_utf8_lossy(name).into_owned(),
            ])),
            None | Some(Object::Null) | Some(Object::Name(_)) => Ok(FieldValue::Selected(Vec::new())),
            Some(other) => Err(format!("Radio value has unexpected type: {:?}", other)),
        },
        FieldKind::CheckBox => match value {
            Some(Object::Name(name)) => Ok(FieldValue::Checked(name.as_slice() != b"Off")),
            None | Some(Object::Null) => Ok(FieldValue::Checked(false)),
            Some(other) => Err(format!("Checkbox value has unexpected type: {:?}", other)),
        },
        FieldKind::PushButton | FieldKind::Signature => Ok(FieldValue::Empty),
    }
}

/// Options of a choice field, in `/Opt` order.
pub fn choice_options(doc: &Document, field: &Field) -> Vec<ChoiceOption> {
    let Some(Object::Array(items)) = inherited(doc, field.id, b"Opt") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match resolve(doc, item).ok()? {
            Object::Array(pair) if pair.len() >= 2 => {
                let export = resolve(doc, &pair[0]).ok().and_then(string_of)?;
                let display = resolve(doc, &pair[1]).ok().and_then(string_of)?;
                Some(ChoiceOption { export, display })
            }
            obj => {
                let text = string_of(obj)?;
                Some(ChoiceOption {
                    export: text.clone(),
                    display: text,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, StringFormat};
    use pretty_assertions::assert_eq;

    fn field_with(doc: &mut Document, kind: FieldKind, entries: Vec<(&str, Object)>) -> Field {
        let id = doc.add_object(Dictionary::from_iter(entries));
        Field {
            id,
            name: "f".into(),
            kind,
            widgets: vec![id],
            parent: None,
        }
    }

    fn lit(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    #[test]
    fn test_text_value() {
        let mut doc = Document::new();
        let field = field_with(&mut doc, FieldKind::Text, vec![("V", lit("Jane Doe"))]);
        assert_eq!(read_value(&doc, &field).unwrap(), FieldValue::Text("Jane Doe".into()));
    }

    #[test]
    fn test_text_value_inherited_from_parent() {
        let mut doc = Document::new();
        let parent = doc.add_object(Dictionary::from_iter(vec![("V", lit("shared"))]));
        let field = field_with(&mut doc, FieldKind::Text, vec![("Parent", Object::Reference(parent))]);
        assert_eq!(field.text_value(&doc).unwrap(), "shared");
    }

    #[test]
    fn test_text_value_wrong_type_is_error() {
        let mut doc = Document::new();
        let field = field_with(&mut doc, FieldKind::Text, vec![("V", Object::Integer(3))]);
        assert!(read_value(&doc, &field).is_err());
    }

    #[test]
    fn test_choice_values_join_with_space() {
        let mut doc = Document::new();
        let field = field_with(
            &mut doc,
            FieldKind::ListBox,
            vec![("V", Object::Array(vec![lit("red"), lit("blue")]))],
        );
        assert_eq!(field.text_value(&doc).unwrap(), "red blue");
    }

    #[test]
    fn test_checkbox_renders_checked() {
        let mut doc = Document::new();
        let on = field_with(&mut doc, FieldKind::CheckBox, vec![("V", Object::Name(b"Yes".to_vec()))]);
        let off = field_with(&mut doc, FieldKind::CheckBox, vec![("V", Object::Name(b"Off".to_vec()))]);
        assert_eq!(on.text_value(&doc).unwrap(), "checked");
        assert_eq!(off.text_value(&doc).unwrap(), "");
    }

    #[test]
    fn test_radio_selected_value() {
        let mut doc = Document::new();
        let field = field_with(
            &mut doc,
            FieldKind::RadioGroup,
            vec![("V", Object::Name(b"Option2".to_vec()))],
        );
        assert_eq!(
            read_value(&doc, &field).unwrap(),
            FieldValue::Selected(vec!["Option2".into()])
        );
    }

    #[test]
    fn test_choice_options_pairs_and_plain() {
        let mut doc = Document::new();
        let field = field_with(
            &mut doc,
            FieldKind::ComboBox,
            vec![(
                "Opt",
                Object::Array(vec![
                    Object::Array(vec![lit("us"), lit("United States")]),
                    lit("Canada"),
                ]),
            )],
        );
        assert_eq!(
            choice_options(&doc, &field),
            vec![
                ChoiceOption {
                    export: "us".into(),
                    display: "United States".into()
                },
                ChoiceOption {
                    export: "Canada".into(),
                    display: "Canada".into()
                },
            ]
        );
    }
}
