//! Interactive PDF form flattening
//!
//! This crate bakes the current appearance of every AcroForm widget into
//! its page's static content stream and then discards the field hierarchy,
//! leaving a PDF that looks the same but can no longer be edited.
//!
//! Flattening runs in three phases:
//! - one document font is chosen (CJK coverage when any value needs it),
//!   fetched through a [`FontSource`] and embedded with a [`FontEmbedder`]
//! - every field's appearance is regenerated in that font
//! - each widget is drawn onto its page as a form XObject and the fields
//!   are removed
//!
//! Problems with a single widget or field are reported through
//! [`FlattenObserver`] and collected in the returned [`FlattenReport`];
//! only a missing font aborts the operation.

pub mod appearance;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod fonts;
pub mod form;
pub mod locate;
pub mod objects;
pub mod pages;
pub mod report;
pub mod select;

pub use config::FlattenConfig;
pub use document::FormDocument;
pub use error::{FieldFailure, FlattenError, WidgetSkip};
pub use flatten::{flatten_pdf, flatten_widget, FlattenedWidget, FormFlattener};
pub use fonts::{
    contains_cjk, is_cjk, DefaultFontSource, EmbedOptions, EmbeddedFont, FileFontSource, FontChoice,
    FontEmbedder, FontSource, Glyph, HttpFontSource, TrueTypeEmbedder,
};
pub use form::{Field, FieldKind, FieldValue, Form};
pub use locate::find_page_for_widget;
pub use report::{FlattenObserver, FlattenReport, NoopObserver};
pub use select::select_appearance;
