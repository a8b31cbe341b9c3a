//! Document wrapper over lopdf

use crate::error::FlattenError;
use crate::form::Form;
use crate::pages;
use lopdf::{Document, ObjectId};
use tracing::debug;

/// A loaded PDF together with its discovered interactive form.
pub struct FormDocument {
    doc: Document,
    form: Form,
}

impl FormDocument {
    /// Load a PDF from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, FlattenError> {
        let doc = Document::load_mem(&bytes)
            .map_err(|e| FlattenError::ParseError(format!("PDF parse error: {}", e)))?;
        Self::from_document(doc)
    }

    /// Wrap an already parsed document
    pub fn from_document(mut doc: Document) -> Result<Self, FlattenError> {
        let form = Form::load(&mut doc)?;
        Ok(Self { doc, form })
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Borrow the document and its form mutably at the same time.
    pub fn parts_mut(&mut self) -> (&mut Document, &mut Form) {
        (&mut self.doc, &mut self.form)
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Get page object ID for a given page number (1-indexed)
    pub fn page_id(&self, page_num: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page_num).copied()
    }

    /// Page object ids in document order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        pages::page_ids(&self.doc)
    }

    pub fn catalog_id(&self) -> Result<ObjectId, FlattenError> {
        self.doc
            .trailer
            .get(b"Root")
            .and_then(|root| root.as_reference())
            .map_err(|_| FlattenError::ParseError("Trailer has no /Root reference".into()))
    }

    /// Drop `/OCProperties` so no layer setting can hide flattened marks.
    /// Returns whether the catalog had any.
    pub fn remove_optional_content(&mut self) -> Result<bool, FlattenError> {
        let catalog_id = self.catalog_id()?;
        let removed = self
            .doc
            .get_dictionary_mut(catalog_id)?
            .remove(b"OCProperties")
            .is_some();
        if removed {
            debug!("Removed optional content configuration");
        }
        Ok(removed)
    }

    /// Clear the flags that make viewers render the interactive layer
    /// instead of page content: `/XFA` and `/NeedAppearances` on the
    /// AcroForm, `/NeedsRendering` on the catalog.
    pub fn clear_interactive_flags(&mut self) -> Result<(), FlattenError> {
        let catalog_id = self.catalog_id()?;
        self.doc
            .get_dictionary_mut(catalog_id)?
            .remove(b"NeedsRendering");

        if let Some(acroform_id) = self.form.acroform_id() {
            if let Ok(acroform) = self.doc.get_dictionary_mut(acroform_id) {
                acroform.remove(b"XFA");
                acroform.remove(b"NeedAppearances");
            }
        }
        Ok(())
    }

    /// Save the document to bytes, dropping unreachable objects first.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, FlattenError> {
        let pruned = self.doc.prune_objects();
        debug!("Pruned {} unreachable objects", pruned.len());

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| FlattenError::SerializationError(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }
}
