//! Widget Flattener

use crate::error::WidgetSkip;
use crate::form::Field;
use crate::locate::find_page_for_widget;
use crate::objects::{dict_by_id, parse_rect};
use crate::pages::{register_xobject, PageWriter};
use crate::select::select_appearance;
use lopdf::content::Operation;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

/// Name prefix of the XObjects registered on pages for flattened widgets.
pub const XOBJECT_PREFIX: &str = "FlatWidget";

/// Where a widget's appearance ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedWidget {
    pub field: String,
    pub widget: ObjectId,
    pub page: ObjectId,
    /// Resource name the appearance was registered under.
    pub xobject: String,
}

/// Draw the current appearance of `widget` into its page's content.
///
/// The widget annotation itself is left in place; removing it is part of
/// removing the field.
pub fn flatten_widget(
    doc: &mut Document,
    pages: &[ObjectId],
    field: &Field,
    widget: ObjectId,
    writer: &mut PageWriter,
) -> Result<FlattenedWidget, WidgetSkip> {
    let page = find_page_for_widget(doc, pages, widget).ok_or(WidgetSkip::PageNotFound { widget })?;
    let appearance = select_appearance(doc, field, widget).ok_or(WidgetSkip::NoAppearance { widget })?;

    let rect = dict_by_id(doc, widget)
        .ok_or_else(|| "widget is not a dictionary".to_string())
        .and_then(|dict| dict.get(b"Rect").map_err(|_| "no /Rect entry".to_string()))
        .and_then(|rect| parse_rect(doc, rect))
        .map_err(|detail| WidgetSkip::InvalidRect { widget, detail })?;

    let operation_failed = |detail: String| WidgetSkip::Operation { widget, detail };
    mark_form_xobject(doc, appearance).map_err(operation_failed)?;
    let name = register_xobject(doc, page, XOBJECT_PREFIX, appearance).map_err(operation_failed)?;

    let mut ops = vec![Operation::new("q", vec![])];
    ops.extend(translate(rect.x, rect.y));
    // Widget rotation is not read; the appearance is always drawn upright.
    ops.extend(rotate_in_place(0, rect.width, rect.height));
    ops.push(Operation::new("Do", vec![Object::Name(name.clone())]));
    ops.push(Operation::new("Q", vec![]));
    writer.push_operations(doc, page, ops).map_err(operation_failed)?;

    let xobject = String::from_utf8_lossy(&name).into_owned();
    debug!(
        "Flattened widget {:?} of '{}' onto page {:?} as /{}",
        widget, field.name, page, xobject
    );
    Ok(FlattenedWidget {
        field: field.name.clone(),
        widget,
        page,
        xobject,
    })
}

/// `Do` needs `/Subtype /Form`; some writers leave it off appearance streams.
fn mark_form_xobject(doc: &mut Document, stream_id: ObjectId) -> Result<(), String> {
    let stream = doc
        .get_object_mut(stream_id)
        .map_err(|e| format!("Failed to get appearance stream: {}", e))?
        .as_stream_mut()
        .map_err(|_| "Appearance is not a stream".to_string())?;
    if !stream.dict.has(b"Subtype") {
        stream.dict.set("Type", Object::Name(b"XObject".to_vec()));
        stream.dict.set("Subtype", Object::Name(b"Form".to_vec()));
    }
    Ok(())
}

fn cm(matrix: [f64; 6]) -> Operation {
    Operation::new("cm", matrix.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// Translation to `(x, y)`; nothing at the origin.
fn translate(x: f64, y: f64) -> Option<Operation> {
    if x == 0.0 && y == 0.0 {
        return None;
    }
    Some(cm([1.0, 0.0, 0.0, 1.0, x, y]))
}

/// Rotate a `width` x `height` box about itself so it still covers the
/// same area. Only right angles are supported; zero is a no-op.
fn rotate_in_place(degrees: i64, width: f64, height: f64) -> Option<Operation> {
    match degrees.rem_euclid(360) {
        90 => Some(cm([0.0, 1.0, -1.0, 0.0, width, 0.0])),
        180 => Some(cm([-1.0, 0.0, 0.0, -1.0, width, height])),
        270 => Some(cm([0.0, -1.0, 1.0, 0.0, 0.0, height])),
        0 => None,
        other => {
            debug!("Ignoring rotation of {} degrees", other);
            None
        }
    }
}
