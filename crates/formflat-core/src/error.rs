//! Error types for form flattening
//!
//! Fatal problems (the shared font cannot be fetched or embedded, the input
//! is not a PDF) are [`FlattenError`] and abort the whole operation.
//! Problems scoped to one widget or one field are [`WidgetSkip`] and
//! [`FieldFailure`]; they are reported through the diagnostics sink and the
//! operation carries on with the siblings.

use lopdf::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("PDF object error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to fetch font '{location}': {reason}")]
    FontFetch { location: String, reason: String },

    #[error("Font download timed out after {secs}s for '{location}'")]
    FontTimeout { location: String, secs: u64 },

    #[error("Failed to read font file '{path}': {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to embed font: {0}")]
    FontEmbed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Why a single widget was left un-flattened.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetSkip {
    #[error("widget {widget:?}: no owning page found")]
    PageNotFound { widget: ObjectId },

    #[error("widget {widget:?}: no appearance stream available")]
    NoAppearance { widget: ObjectId },

    #[error("widget {widget:?}: unreadable rectangle: {detail}")]
    InvalidRect { widget: ObjectId, detail: String },

    #[error("widget {widget:?}: {detail}")]
    Operation { widget: ObjectId, detail: String },
}

impl WidgetSkip {
    pub fn widget(&self) -> ObjectId {
        match self {
            WidgetSkip::PageNotFound { widget }
            | WidgetSkip::NoAppearance { widget }
            | WidgetSkip::InvalidRect { widget, .. }
            | WidgetSkip::Operation { widget, .. } => *widget,
        }
    }
}

/// A per-field failure that did not stop the operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldFailure {
    #[error("field '{field}': value could not be read: {detail}")]
    ValueUnreadable { field: String, detail: String },

    #[error("field '{field}': appearance update failed: {detail}")]
    AppearanceUpdate { field: String, detail: String },

    #[error("field '{field}': removal failed: {detail}")]
    Removal { field: String, detail: String },
}

impl FieldFailure {
    pub fn field(&self) -> &str {
        match self {
            FieldFailure::ValueUnreadable { field, .. }
            | FieldFailure::AppearanceUpdate { field, .. }
            | FieldFailure::Removal { field, .. } => field,
        }
    }
}
