//! Appearance selection
//!
//! Picks the normal-appearance stream that shows a widget in its field's
//! current state.

use crate::form::Field;
use crate::objects::{dict_by_id, get_resolved};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

/// The widget's `/AP /N` entry, as stored (reference or inline dictionary).
pub fn normal_appearance<'a>(doc: &'a Document, widget: ObjectId) -> Option<&'a Object> {
    let widget_dict = dict_by_id(doc, widget)?;
    let ap = get_resolved(doc, widget_dict, b"AP")?.as_dict().ok()?;
    ap.get(b"N").ok()
}

/// Look up the stream for a two-state widget in a state-keyed dictionary:
/// the entry for `key` if present, else the `Off` entry. The hit must be a
/// reference.
pub fn select_state(states: &Dictionary, key: Option<&[u8]>) -> Option<ObjectId> {
    let entry = key
        .and_then(|k| states.get(k).ok())
        .or_else(|| states.get(b"Off").ok())?;
    match entry {
        Object::Reference(id) => Some(*id),
        _ => None,
    }
}

/// Resolve the appearance stream to draw for `widget` of `field`.
pub fn select_appearance(doc: &Document, field: &Field, widget: ObjectId) -> Option<ObjectId> {
    let Some(normal) = normal_appearance(doc, widget) else {
        debug!("Widget {:?} of '{}' has no normal appearance", widget, field.name);
        return None;
    };

    match normal {
        Object::Reference(id) => match doc.objects.get(id) {
            Some(Object::Stream(_)) => Some(*id),
            Some(Object::Dictionary(states)) if field.kind.is_two_state() => {
                select_state(states, field.appearance_key(doc).as_deref())
            }
            _ => {
                debug!("Appearance of widget {:?} is not a stream", widget);
                None
            }
        },
        Object::Dictionary(states) if field.kind.is_two_state() => {
            select_state(states, field.appearance_key(doc).as_deref())
        }
        _ => {
            debug!(
                "Appearance of widget {:?} has an unsupported shape for {:?}",
                widget, field.kind
            );
            None
        }
    }
}
