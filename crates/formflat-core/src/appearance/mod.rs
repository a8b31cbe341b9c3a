//! Appearance regeneration
//!
//! Before flattening, every field gets a normal appearance that shows its
//! current value in the embedded document font. A failing widget is
//! reported against its field; the remaining widgets and fields are still
//! processed.

pub mod da;
pub mod draw;

use crate::error::FieldFailure;
use crate::fonts::EmbeddedFont;
use crate::form::{choice_options, inherited, Field, FieldKind, FieldValue, Form, FLAG_COMB, FLAG_MULTILINE};
use crate::objects::{dict_by_id, extract_number, get_integer, get_resolved, get_text, parse_rect, resolve, Rect};
use crate::report::FlattenObserver;
use crate::select::normal_appearance;
use da::{widget_da, Color};
use draw::{Alignment, Frame, TextLayout};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

/// Resource name of the embedded font inside generated appearance streams.
pub const FONT_RESOURCE: &str = "FlatFont";

/// Regenerate appearances for every field of `form`. Returns how many fields
/// received a new appearance.
pub fn regenerate_appearances(
    doc: &mut Document,
    form: &Form,
    font: &EmbeddedFont,
    observer: &mut dyn FlattenObserver,
) -> usize {
    let mut regenerated = 0;
    for field in form.fields() {
        let mut failures = Vec::new();
        match regenerate_field(doc, form, field, font, &mut failures) {
            Ok(true) => {
                debug!("Regenerated appearance of '{}'", field.name);
                observer.appearance_regenerated(&field.name);
                regenerated += 1;
            }
            Ok(false) => {}
            Err(detail) => failures.push(detail),
        }
        for detail in failures {
            warn!("Appearance update failed for '{}': {}", field.name, detail);
            observer.field_failed(&FieldFailure::AppearanceUpdate {
                field: field.name.clone(),
                detail,
            });
        }
    }
    regenerated
}

/// Run `update` on every widget of `field`. A failing widget is recorded in
/// `failures` and the rest are still updated. Returns whether any widget
/// received a new appearance.
fn for_each_widget<F>(field: &Field, failures: &mut Vec<String>, mut update: F) -> bool
where
    F: FnMut(ObjectId) -> Result<bool, String>,
{
    let mut any = false;
    for &widget in &field.widgets {
        match update(widget) {
            Ok(updated) => any |= updated,
            Err(detail) => failures.push(detail),
        }
    }
    any
}

/// Field-level errors (an unreadable value) are returned; widget-level
/// errors go to `failures`.
fn regenerate_field(
    doc: &mut Document,
    form: &Form,
    field: &Field,
    font: &EmbeddedFont,
    failures: &mut Vec<String>,
) -> Result<bool, String> {
    match field.kind {
        FieldKind::Text => {
            let text = match field.value(doc)? {
                FieldValue::Text(text) => text,
                other => other.display_text(),
            };
            let flags = field.flags(doc);
            let comb = if flags & FLAG_COMB != 0 {
                inherited_integer(doc, field.id, b"MaxLen").map(|n| n.max(0) as usize)
            } else {
                None
            };
            Ok(for_each_widget(field, failures, |widget| {
                let layout = TextLayout {
                    alignment: quadding(doc, form, field, widget),
                    multiline: flags & FLAG_MULTILINE != 0,
                    comb,
                };
                draw_text_widget(doc, form, field, widget, font, &text, layout).map(|()| true)
            }))
        }
        FieldKind::ComboBox => {
            let selected = selected_values(doc, field)?;
            let options = choice_options(doc, field);
            let text = selected
                .first()
                .map(|export| {
                    options
                        .iter()
                        .find(|o| &o.export == export)
                        .map(|o| o.display.clone())
                        .unwrap_or_else(|| export.clone())
                })
                .unwrap_or_default();
            Ok(for_each_widget(field, failures, |widget| {
                let layout = TextLayout {
                    alignment: quadding(doc, form, field, widget),
                    ..TextLayout::default()
                };
                draw_text_widget(doc, form, field, widget, font, &text, layout).map(|()| true)
            }))
        }
        FieldKind::ListBox => {
            let selected = selected_values(doc, field)?;
            let options = choice_options(doc, field);
            let labels: Vec<String> = options.iter().map(|o| o.display.clone()).collect();
            let rows: Vec<usize> = options
                .iter()
                .enumerate()
                .filter(|(_, o)| selected.contains(&o.export))
                .map(|(i, _)| i)
                .collect();
            let top_index = inherited_integer(doc, field.id, b"TI").unwrap_or(0).max(0) as usize;
            Ok(for_each_widget(field, failures, |widget| {
                let (frame, rect) = widget_frame(doc, widget)?;
                let da = widget_da(doc, form.acroform_id(), field.id, widget);
                let ops = draw::list_ops(font, &frame, &da, &labels, &rows, top_index);
                let stream = add_form_xobject(doc, &rect, ops, Some(font))?;
                set_normal_appearance(doc, widget, Object::Reference(stream))?;
                Ok(true)
            }))
        }
        FieldKind::CheckBox | FieldKind::RadioGroup => Ok(for_each_widget(field, failures, |widget| {
            update_toggle_widget(doc, form, field, widget)
        })),
        FieldKind::PushButton => Ok(for_each_widget(field, failures, |widget| {
            if normal_appearance(doc, widget).is_some() {
                return Ok(false);
            }
            let caption = dict_by_id(doc, widget)
                .and_then(|w| get_resolved(doc, w, b"MK"))
                .and_then(|mk| mk.as_dict().ok())
                .and_then(|mk| get_text(doc, mk, b"CA"))
                .unwrap_or_default();
            let (frame, rect) = widget_frame(doc, widget)?;
            let da = widget_da(doc, form.acroform_id(), field.id, widget);
            let ops = draw::button_ops(font, &frame, &da, &caption);
            let stream = add_form_xobject(doc, &rect, ops, Some(font))?;
            set_normal_appearance(doc, widget, Object::Reference(stream))?;
            Ok(true)
        })),
        FieldKind::Signature => Ok(false),
    }
}

fn selected_values(doc: &Document, field: &Field) -> Result<Vec<String>, String> {
    Ok(match field.value(doc)? {
        FieldValue::Selected(values) => values,
        FieldValue::Text(text) if !text.is_empty() => vec![text],
        _ => Vec::new(),
    })
}

fn inherited_integer(doc: &Document, id: ObjectId, key: &[u8]) -> Option<i64> {
    match inherited(doc, id, key)? {
        Object::Integer(i) => Some(*i),
        _ => None,
    }
}

/// `/Q` from the widget, the field chain, then the AcroForm.
fn quadding(doc: &Document, form: &Form, field: &Field, widget: ObjectId) -> Alignment {
    let own = dict_by_id(doc, widget).and_then(|w| get_integer(doc, w, b"Q"));
    let q = own
        .or_else(|| inherited_integer(doc, field.id, b"Q"))
        .or_else(|| {
            form.acroform_id()
                .and_then(|id| dict_by_id(doc, id))
                .and_then(|f| get_integer(doc, f, b"Q"))
        })
        .unwrap_or(0);
    Alignment::from_quadding(q)
}

/// Box, colours and border width of a widget, plus its page rectangle.
fn widget_frame(doc: &Document, widget: ObjectId) -> Result<(Frame, Rect), String> {
    let dict = dict_by_id(doc, widget).ok_or_else(|| format!("Widget {:?} is not a dictionary", widget))?;
    let rect = dict
        .get(b"Rect")
        .map_err(|_| format!("Widget {:?} has no /Rect", widget))
        .and_then(|r| parse_rect(doc, r))?;

    let mk = get_resolved(doc, dict, b"MK").and_then(|mk| mk.as_dict().ok());
    let background = mk
        .and_then(|mk| mk.get(b"BG").ok())
        .and_then(|bg| Color::from_array(doc, bg));
    let border = mk
        .and_then(|mk| mk.get(b"BC").ok())
        .and_then(|bc| Color::from_array(doc, bc));
    let border_width = get_resolved(doc, dict, b"BS")
        .and_then(|bs| bs.as_dict().ok())
        .and_then(|bs| bs.get(b"W").ok())
        .and_then(|w| extract_number(doc, w).ok())
        .unwrap_or(if border.is_some() { 1.0 } else { 0.0 });

    let frame = Frame {
        border_width,
        background,
        border,
        ..Frame::new(rect.width, rect.height)
    };
    Ok((frame, rect))
}

fn draw_text_widget(
    doc: &mut Document,
    form: &Form,
    field: &Field,
    widget: ObjectId,
    font: &EmbeddedFont,
    text: &str,
    layout: TextLayout,
) -> Result<(), String> {
    let (frame, rect) = widget_frame(doc, widget)?;
    let da = widget_da(doc, form.acroform_id(), field.id, widget);
    let ops = draw::text_ops(font, &frame, &da, text, layout);
    let stream = add_form_xobject(doc, &rect, ops, Some(font))?;
    set_normal_appearance(doc, widget, Object::Reference(stream))
}

/// Sync `/AS` with the field value and build the state appearances when the
/// widget has none, or has a state dictionary lacking its current `/AS`. A
/// single appearance stream is kept as it is.
fn update_toggle_widget(doc: &mut Document, form: &Form, field: &Field, widget: ObjectId) -> Result<bool, String> {
    let normal = match normal_appearance(doc, widget) {
        Some(n) => resolve(doc, n).ok(),
        None => None,
    };
    let existing: Option<Dictionary> = match normal {
        Some(Object::Stream(_)) => {
            debug!("Widget {:?} of '{}' has a single appearance stream", widget, field.name);
            return Ok(false);
        }
        Some(Object::Dictionary(states)) => Some(states.clone()),
        _ => None,
    };
    let current_state = dict_by_id(doc, widget)
        .and_then(|w| w.get(b"AS").ok())
        .and_then(|state| state.as_name().ok())
        .map(|state| state.to_vec());
    let needs_states = match (&existing, &current_state) {
        (None, _) => true,
        (Some(states), Some(state)) => !states.has(state),
        (Some(_), None) => false,
    };
    let existing_on = existing.as_ref().and_then(|states| {
        states
            .iter()
            .map(|(key, _)| key.clone())
            .find(|key| key.as_slice() != b"Off")
    });
    let value_key = field.appearance_key(doc);

    let on_state = match (existing_on, field.kind) {
        (Some(key), _) => Some(key),
        (None, FieldKind::CheckBox) => Some(value_key.clone().unwrap_or_else(|| b"Yes".to_vec())),
        (None, _) => None,
    };
    let desired = match &on_state {
        Some(on) if value_key.as_deref() == Some(on.as_slice()) => on.clone(),
        _ => b"Off".to_vec(),
    };
    dict_mut(doc, widget)?.set("AS", Object::Name(desired));

    if !needs_states {
        return Ok(false);
    }
    let Some(on_state) = on_state else {
        return Err(format!(
            "Radio widget {:?} has no on-state appearance to select",
            widget
        ));
    };

    let (frame, rect) = widget_frame(doc, widget)?;
    let color = widget_da(doc, form.acroform_id(), field.id, widget).color;
    let (on_ops, off_ops) = match field.kind {
        FieldKind::RadioGroup => (draw::radio_on_ops(&frame, color), draw::radio_off_ops(&frame)),
        _ => (draw::check_ops(&frame, color), draw::frame_ops(&frame)),
    };
    let on_stream = add_form_xobject(doc, &rect, on_ops, None)?;
    let off_stream = add_form_xobject(doc, &rect, off_ops, None)?;

    let states = Dictionary::from_iter(vec![
        (on_state, Object::Reference(on_stream)),
        (b"Off".to_vec(), Object::Reference(off_stream)),
    ]);
    set_normal_appearance(doc, widget, Object::Dictionary(states))?;
    Ok(true)
}

fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, String> {
    doc.get_object_mut(id)
        .map_err(|e| format!("Failed to get widget {:?}: {}", id, e))?
        .as_dict_mut()
        .map_err(|_| format!("Widget {:?} is not a dictionary", id))
}

/// Write a form XObject sized to `rect` with `ops` as content.
pub(crate) fn add_form_xobject(
    doc: &mut Document,
    rect: &Rect,
    ops: Vec<Operation>,
    font: Option<&EmbeddedFont>,
) -> Result<ObjectId, String> {
    let content = Content { operations: ops }
        .encode()
        .map_err(|e| format!("Failed to encode appearance: {}", e))?;

    let mut dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Form".to_vec())),
        (
            "BBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(rect.width as f32),
                Object::Real(rect.height as f32),
            ]),
        ),
    ]);
    if let Some(font) = font {
        let fonts = Dictionary::from_iter(vec![(FONT_RESOURCE, Object::Reference(font.font_id))]);
        dict.set(
            "Resources",
            Object::Dictionary(Dictionary::from_iter(vec![("Font", Object::Dictionary(fonts))])),
        );
    }
    Ok(doc.add_object(Stream::new(dict, content)))
}

/// Replace the widget's `/AP` with one holding only `normal`.
fn set_normal_appearance(doc: &mut Document, widget: ObjectId, normal: Object) -> Result<(), String> {
    let ap = Dictionary::from_iter(vec![("N", normal)]);
    dict_mut(doc, widget)?.set("AP", Object::Dictionary(ap));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::embed::testing::helvetica;
    use crate::form::{FLAG_COMBO, FLAG_RADIO};
    use crate::report::FlattenReport;
    use crate::select::select_appearance;
    use lopdf::StringFormat;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Object {
        Object::Array(vec![
            Object::Real(x as f32),
            Object::Real(y as f32),
            Object::Real((x + w) as f32),
            Object::Real((y + h) as f32),
        ])
    }

    /// One-page document whose AcroForm lists the given merged field/widget dictionaries.
    fn build(fields: Vec<Vec<(&str, Object)>>) -> (Document, Form) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
        ]));
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Count", Object::Integer(1)),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ])),
        );
        let mut roots = Vec::new();
        for mut entries in fields {
            entries.push(("Subtype", Object::Name(b"Widget".to_vec())));
            entries.push(("P", Object::Reference(page_id)));
            roots.push(Object::Reference(doc.add_object(Dictionary::from_iter(entries))));
        }
        let acroform = doc.add_object(Dictionary::from_iter(vec![
            ("Fields", Object::Array(roots)),
            ("DA", text("/Helv 0 Tf 0 g")),
        ]));
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
            ("AcroForm", Object::Reference(acroform)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let form = Form::load(&mut doc).unwrap();
        (doc, form)
    }

    /// Like `build` with no merged fields, plus one parent field whose
    /// widgets are `kids`.
    fn build_with_kids(entries: Vec<(&str, Object)>, kids: Vec<Vec<(&str, Object)>>) -> (Document, Form) {
        let (mut doc, _) = build(vec![]);
        let page_id = *doc.get_pages().values().next().unwrap();
        let parent_id = doc.new_object_id();
        let mut kid_refs = Vec::new();
        for mut kid in kids {
            kid.push(("Subtype", Object::Name(b"Widget".to_vec())));
            kid.push(("P", Object::Reference(page_id)));
            kid.push(("Parent", Object::Reference(parent_id)));
            kid_refs.push(Object::Reference(doc.add_object(Dictionary::from_iter(kid))));
        }
        let mut parent = Dictionary::from_iter(entries);
        parent.set("Kids", Object::Array(kid_refs));
        doc.objects.insert(parent_id, Object::Dictionary(parent));

        let acroform = doc
            .catalog()
            .unwrap()
            .get(b"AcroForm")
            .unwrap()
            .as_reference()
            .unwrap();
        doc.get_dictionary_mut(acroform)
            .unwrap()
            .set("Fields", Object::Array(vec![Object::Reference(parent_id)]));
        let form = Form::load(&mut doc).unwrap();
        (doc, form)
    }

    fn normal_stream<'a>(doc: &'a Document, widget: ObjectId) -> &'a Stream {
        let id = normal_appearance(doc, widget).unwrap().as_reference().unwrap();
        doc.get_object(id).unwrap().as_stream().unwrap()
    }

    fn operators(stream: &Stream) -> Vec<String> {
        Content::decode(&stream.content)
            .unwrap()
            .operations
            .into_iter()
            .map(|o| o.operator)
            .collect()
    }

    #[test]
    fn test_text_field_gets_form_xobject() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("name")),
            ("FT", Object::Name(b"Tx".to_vec())),
            ("V", text("Jane")),
            ("Rect", rect(10.0, 10.0, 200.0, 20.0)),
        ]]);
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 1);
        assert_eq!(report.regenerated, vec!["name".to_string()]);

        let widget = form.fields()[0].widgets[0];
        let stream = normal_stream(&doc, widget);
        assert_eq!(stream.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Form");
        let font_ref = stream
            .dict
            .get(b"Resources")
            .and_then(|r| r.as_dict())
            .and_then(|r| r.get(b"Font"))
            .and_then(|f| f.as_dict())
            .and_then(|f| f.get(FONT_RESOURCE.as_bytes()))
            .and_then(|f| f.as_reference())
            .unwrap();
        assert_eq!(font_ref, font.font_id);
        assert!(operators(stream).contains(&"Tj".to_string()));
    }

    #[test]
    fn test_combo_shows_display_of_selected_option() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("colour")),
            ("FT", Object::Name(b"Ch".to_vec())),
            ("Ff", Object::Integer(FLAG_COMBO)),
            ("V", text("r")),
            (
                "Opt",
                Object::Array(vec![Object::Array(vec![text("r"), text("Red")])]),
            ),
            ("Rect", rect(0.0, 0.0, 100.0, 20.0)),
        ]]);
        let font = helvetica(&mut doc);
        regenerate_appearances(&mut doc, &form, &font, &mut FlattenReport::default());

        let stream = normal_stream(&doc, form.fields()[0].widgets[0]);
        let shown = Content::decode(&stream.content)
            .unwrap()
            .operations
            .into_iter()
            .find(|o| o.operator == "Tj")
            .and_then(|o| o.operands.first().cloned())
            .and_then(|o| o.as_str().ok().map(|s| s.to_vec()))
            .unwrap();
        assert_eq!(shown, font.encode("Red"));
    }

    #[test]
    fn test_checkbox_with_states_only_syncs_as() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("agree")),
            ("FT", Object::Name(b"Btn".to_vec())),
            ("V", Object::Name(b"Yes".to_vec())),
            ("AS", Object::Name(b"Off".to_vec())),
            ("Rect", rect(0.0, 0.0, 20.0, 20.0)),
        ]]);
        let widget = form.fields()[0].widgets[0];
        let yes = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m".to_vec()));
        let off = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        set_normal_appearance(
            &mut doc,
            widget,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Yes", Object::Reference(yes)),
                ("Off", Object::Reference(off)),
            ])),
        )
        .unwrap();
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 0);
        let as_name = doc.get_dictionary(widget).unwrap().get(b"AS").unwrap().as_name().unwrap().to_vec();
        assert_eq!(as_name, b"Yes".to_vec());
        assert_eq!(select_appearance(&doc, &form.fields()[0], widget), Some(yes));
    }

    #[test]
    fn test_checkbox_without_appearance_gets_states() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("agree")),
            ("FT", Object::Name(b"Btn".to_vec())),
            ("V", Object::Name(b"Yes".to_vec())),
            ("Rect", rect(0.0, 0.0, 20.0, 20.0)),
        ]]);
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();
        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 1);

        let widget = form.fields()[0].widgets[0];
        let states = normal_appearance(&doc, widget).unwrap().as_dict().unwrap();
        assert!(states.has(b"Yes"));
        assert!(states.has(b"Off"));
        assert!(select_appearance(&doc, &form.fields()[0], widget).is_some());
    }

    #[test]
    fn test_checkbox_with_single_stream_is_kept() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("agree")),
            ("FT", Object::Name(b"Btn".to_vec())),
            ("V", Object::Name(b"Yes".to_vec())),
            ("Rect", rect(0.0, 0.0, 20.0, 20.0)),
        ]]);
        let widget = form.fields()[0].widgets[0];
        let face = doc.add_object(Stream::new(
            Dictionary::from_iter(vec![
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Form".to_vec())),
                ("BBox", rect(0.0, 0.0, 20.0, 20.0)),
            ]),
            b"0 0 20 20 re f".to_vec(),
        ));
        set_normal_appearance(&mut doc, widget, Object::Reference(face)).unwrap();
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 0);
        assert!(report.is_clean());
        assert_eq!(normal_appearance(&doc, widget).unwrap().as_reference().unwrap(), face);
        assert_eq!(select_appearance(&doc, &form.fields()[0], widget), Some(face));
    }

    #[test]
    fn test_bad_widget_does_not_stop_its_siblings() {
        let (mut doc, form) = build_with_kids(
            vec![
                ("T", text("name")),
                ("FT", Object::Name(b"Tx".to_vec())),
                ("V", text("Jane")),
            ],
            vec![
                vec![("Rect", rect(10.0, 10.0, 100.0, 20.0))],
                vec![("Rect", Object::Array(vec![Object::Integer(1)]))],
                vec![("Rect", rect(10.0, 40.0, 100.0, 20.0))],
            ],
        );
        let widgets = form.fields()[0].widgets.clone();
        assert_eq!(widgets.len(), 3);
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 1);
        assert!(matches!(
            report.failures.as_slice(),
            [FieldFailure::AppearanceUpdate { field, .. }] if field == "name"
        ));
        assert!(operators(normal_stream(&doc, widgets[0])).contains(&"Tj".to_string()));
        assert!(normal_appearance(&doc, widgets[1]).is_none());
        assert!(operators(normal_stream(&doc, widgets[2])).contains(&"Tj".to_string()));
    }

    #[test]
    fn test_empty_state_dictionary_is_left_alone() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("agree")),
            ("FT", Object::Name(b"Btn".to_vec())),
            ("V", Object::Name(b"Yes".to_vec())),
            ("Rect", rect(0.0, 0.0, 20.0, 20.0)),
        ]]);
        let widget = form.fields()[0].widgets[0];
        set_normal_appearance(&mut doc, widget, Object::Dictionary(Dictionary::new())).unwrap();
        let font = helvetica(&mut doc);

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut FlattenReport::default()), 0);
        assert!(normal_appearance(&doc, widget).unwrap().as_dict().unwrap().is_empty());
        assert_eq!(select_appearance(&doc, &form.fields()[0], widget), None);
    }

    #[test]
    fn test_radio_without_on_state_is_field_failure() {
        let (mut doc, form) = build(vec![
            vec![
                ("T", text("choice")),
                ("FT", Object::Name(b"Btn".to_vec())),
                ("Ff", Object::Integer(FLAG_RADIO)),
                ("V", Object::Name(b"A".to_vec())),
                ("Rect", rect(0.0, 0.0, 20.0, 20.0)),
            ],
            vec![
                ("T", text("name")),
                ("FT", Object::Name(b"Tx".to_vec())),
                ("V", text("x")),
                ("Rect", rect(0.0, 30.0, 100.0, 20.0)),
            ],
        ]);
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].field(), "choice");
        assert_eq!(report.regenerated, vec!["name".to_string()]);
    }

    #[test]
    fn test_push_button_with_appearance_is_untouched() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("submit")),
            ("FT", Object::Name(b"Btn".to_vec())),
            ("Ff", Object::Integer(crate::form::FLAG_PUSHBUTTON)),
            ("Rect", rect(0.0, 0.0, 60.0, 20.0)),
        ]]);
        let widget = form.fields()[0].widgets[0];
        let face = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        set_normal_appearance(&mut doc, widget, Object::Reference(face)).unwrap();
        let font = helvetica(&mut doc);

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut FlattenReport::default()), 0);
        assert_eq!(normal_appearance(&doc, widget).unwrap().as_reference().unwrap(), face);
    }

    #[test]
    fn test_bad_value_type_reports_failure() {
        let (mut doc, form) = build(vec![vec![
            ("T", text("name")),
            ("FT", Object::Name(b"Tx".to_vec())),
            ("V", Object::Integer(5)),
            ("Rect", rect(0.0, 0.0, 100.0, 20.0)),
        ]]);
        let font = helvetica(&mut doc);
        let mut report = FlattenReport::default();

        assert_eq!(regenerate_appearances(&mut doc, &form, &font, &mut report), 0);
        assert!(matches!(
            report.failures.as_slice(),
            [FieldFailure::AppearanceUpdate { field, .. }] if field == "name"
        ));
    }

    #[test]
    fn test_widget_frame_reads_mk_and_border() {
        let (doc, form) = build(vec![vec![
            ("T", text("name")),
            ("FT", Object::Name(b"Tx".to_vec())),
            ("Rect", rect(5.0, 5.0, 50.0, 10.0)),
            (
                "MK",
                Object::Dictionary(Dictionary::from_iter(vec![
                    ("BG", Object::Array(vec![Object::Integer(1)])),
                    ("BC", Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(1)])),
                ])),
            ),
        ]]);
        let (frame, rect) = widget_frame(&doc, form.fields()[0].widgets[0]).unwrap();
        assert_eq!(rect, Rect::new(5.0, 5.0, 50.0, 10.0));
        assert_eq!(frame.background, Some(Color::Gray(1.0)));
        assert_eq!(frame.border, Some(Color::Rgb(0.0, 0.0, 1.0)));
        assert_eq!(frame.border_width, 1.0);
    }
}
