//! Page-level plumbing: annotation arrays, XObject resources and content
//! stream appends.

use crate::objects::{dict_by_id, reference_array, remove_references, resolve, MAX_DEPTH};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Page object ids in document order.
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// References listed in a page's `/Annots` array (direct or indirect).
pub fn annotation_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    dict_by_id(doc, page_id)
        .and_then(|page| page.get(b"Annots").ok())
        .map(|annots| reference_array(doc, annots))
        .unwrap_or_default()
}

/// Where a dictionary-valued entry lives relative to its owner.
enum Slot {
    Inline,
    Indirect(ObjectId),
    Missing,
}

fn slot_of(dict: &Dictionary, key: &[u8]) -> Slot {
    match dict.get(key) {
        Ok(Object::Reference(id)) => Slot::Indirect(*id),
        Ok(_) => Slot::Inline,
        Err(_) => Slot::Missing,
    }
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, String> {
    doc.get_object_mut(page_id)
        .map_err(|e| format!("Failed to get page object: {}", e))?
        .as_dict_mut()
        .map_err(|_| "Page is not a dictionary".to_string())
}

/// Remove every listed id from the page's `/Annots`. Returns how many entries went away.
pub fn remove_annotations(
    doc: &mut Document,
    page_id: ObjectId,
    targets: &[ObjectId],
) -> Result<usize, String> {
    remove_references(doc, page_id, b"Annots", targets)
}

/// Find the nearest `/Resources` inherited through the `/Parent` chain.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut current = dict_by_id(doc, page_id)?;
    for _ in 0..MAX_DEPTH {
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = dict_by_id(doc, parent)?;
        if let Ok(resources) = current.get(b"Resources") {
            return match resolve(doc, resources).ok()? {
                Object::Dictionary(dict) => Some(dict.clone()),
                _ => None,
            };
        }
    }
    None
}

/// Get the page's own resources dictionary for mutation, copying inherited
/// resources onto the page first when it has none of its own.
fn resources_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary, String> {
    let slot = {
        let page = dict_by_id(doc, page_id).ok_or("Page is not a dictionary")?;
        slot_of(page, b"Resources")
    };

    match slot {
        Slot::Indirect(id) => doc
            .get_object_mut(id)
            .map_err(|e| format!("Failed to get resources: {}", e))?
            .as_dict_mut()
            .map_err(|_| "Resources is not a dictionary".to_string()),
        Slot::Missing => {
            let resources = inherited_resources(doc, page_id).unwrap_or_default();
            let page = page_dict_mut(doc, page_id)?;
            page.set("Resources", Object::Dictionary(resources));
            page.get_mut(b"Resources")
                .map_err(|e| format!("Failed to get resources: {}", e))?
                .as_dict_mut()
                .map_err(|_| "Resources is not a dictionary".to_string())
        }
        Slot::Inline => page_dict_mut(doc, page_id)?
            .get_mut(b"Resources")
            .map_err(|e| format!("Failed to get resources: {}", e))?
            .as_dict_mut()
            .map_err(|_| "Resources is not a dictionary".to_string()),
    }
}

/// Register `stream_id` as a form XObject on the page under a fresh
/// `/<prefix>-N` name and return that name.
pub fn register_xobject(
    doc: &mut Document,
    page_id: ObjectId,
    prefix: &str,
    stream_id: ObjectId,
) -> Result<Vec<u8>, String> {
    let xobject_slot = slot_of(resources_mut(doc, page_id)?, b"XObject");

    let xobjects: &mut Dictionary = match xobject_slot {
        Slot::Indirect(id) => doc
            .get_object_mut(id)
            .map_err(|e| format!("Failed to get XObject dictionary: {}", e))?
            .as_dict_mut()
            .map_err(|_| "XObject entry is not a dictionary".to_string())?,
        Slot::Missing => {
            let resources = resources_mut(doc, page_id)?;
            resources.set("XObject", Object::Dictionary(Dictionary::new()));
            resources
                .get_mut(b"XObject")
                .map_err(|e| format!("Failed to get XObject dictionary: {}", e))?
                .as_dict_mut()
                .map_err(|_| "XObject entry is not a dictionary".to_string())?
        }
        Slot::Inline => resources_mut(doc, page_id)?
            .get_mut(b"XObject")
            .map_err(|e| format!("Failed to get XObject dictionary: {}", e))?
            .as_dict_mut()
            .map_err(|_| "XObject entry is not a dictionary".to_string())?,
    };

    let name = (1..)
        .map(|n| format!("{}-{}", prefix, n).into_bytes())
        .find(|candidate| !xobjects.has(candidate))
        .ok_or("No free XObject name")?;
    xobjects.set(name.clone(), Object::Reference(stream_id));
    Ok(name)
}

/// Appends drawing operators to page content streams.
///
/// The first append to a page wraps the existing content in `q ... Q` and
/// adds one new stream after it; later appends extend that same stream.
#[derive(Debug, Default)]
pub struct PageWriter {
    streams: HashMap<ObjectId, ObjectId>,
}

impl PageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages that received operators.
    pub fn pages_written(&self) -> usize {
        self.streams.len()
    }

    pub fn push_operations(
        &mut self,
        doc: &mut Document,
        page_id: ObjectId,
        operations: Vec<Operation>,
    ) -> Result<(), String> {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| format!("Failed to encode operators: {}", e))?;

        if let Some(stream_id) = self.streams.get(&page_id) {
            let stream = doc
                .get_object_mut(*stream_id)
                .map_err(|e| format!("Failed to get content stream: {}", e))?
                .as_stream_mut()
                .map_err(|_| "Content object is not a stream".to_string())?;
            let mut content = stream.content.clone();
            content.push(b'\n');
            content.extend_from_slice(&encoded);
            stream.set_content(content);
            return Ok(());
        }

        let existing = {
            let page = dict_by_id(doc, page_id).ok_or("Page is not a dictionary")?;
            match page.get(b"Contents") {
                Ok(contents) => match resolve(doc, contents)? {
                    Object::Stream(_) => vec![contents.as_reference().map_err(|_| {
                        "Contents stream is not an indirect object".to_string()
                    })?],
                    Object::Array(_) => reference_array(doc, contents),
                    _ => return Err("Contents is neither a stream nor an array".to_string()),
                },
                Err(_) => Vec::new(),
            }
        };

        let mut contents = Vec::with_capacity(existing.len() + 3);
        if !existing.is_empty() {
            let push_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let pop_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
            contents.push(Object::Reference(push_id));
            contents.extend(existing.into_iter().map(Object::Reference));
            contents.push(Object::Reference(pop_id));
        }
        let stream_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        contents.push(Object::Reference(stream_id));

        page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
        self.streams.insert(page_id, stream_id);
        Ok(())
    }
}
