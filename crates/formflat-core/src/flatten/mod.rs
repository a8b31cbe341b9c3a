//! Form flattening driver
//!
//! Turns every widget's current appearance into static page content and
//! then removes the interactive form. One font is chosen, fetched and
//! embedded per operation; failing to get it aborts the whole operation.
//! Everything after that is isolated per widget or per field.

pub mod widget;

pub use widget::{flatten_widget, FlattenedWidget, XOBJECT_PREFIX};

use crate::appearance::regenerate_appearances;
use crate::config::FlattenConfig;
use crate::document::FormDocument;
use crate::error::{FieldFailure, FlattenError};
use crate::fonts::{DefaultFontSource, FontEmbedder, FontResolver, FontSource, TrueTypeEmbedder};
use crate::pages::{page_ids, PageWriter};
use crate::report::{FlattenObserver, FlattenReport, NoopObserver, Tee};
use tracing::{debug, info, warn};

/// Flattens interactive forms using a pluggable font source and embedder.
pub struct FormFlattener<'a> {
    source: &'a dyn FontSource,
    embedder: &'a dyn FontEmbedder,
    config: &'a FlattenConfig,
}

impl<'a> FormFlattener<'a> {
    pub fn new(source: &'a dyn FontSource, embedder: &'a dyn FontEmbedder, config: &'a FlattenConfig) -> Self {
        Self {
            source,
            embedder,
            config,
        }
    }

    /// Flatten `document` in place.
    pub async fn flatten(&self, document: &mut FormDocument) -> Result<FlattenReport, FlattenError> {
        self.flatten_with_observer(document, &mut NoopObserver).await
    }

    /// Flatten `document` in place, forwarding every outcome to `observer`
    /// as well as collecting it in the returned report.
    pub async fn flatten_with_observer(
        &self,
        document: &mut FormDocument,
        observer: &mut dyn FlattenObserver,
    ) -> Result<FlattenReport, FlattenError> {
        let mut report = FlattenReport::default();
        let mut sink = Tee {
            first: &mut report,
            second: observer,
        };

        document.remove_optional_content()?;

        if document.form().is_empty() {
            debug!("Document has no form fields, nothing to flatten");
            document.clear_interactive_flags()?;
            return Ok(report);
        }

        {
            let (doc, form) = document.parts_mut();
            let resolver = FontResolver::new(self.source, self.embedder, self.config);
            let (_, font) = resolver.resolve(doc, form, &mut sink).await?;
            regenerate_appearances(doc, form, &font, &mut sink);

            let pages = page_ids(doc);
            let mut writer = PageWriter::new();
            for field in form.fields() {
                for &widget in &field.widgets {
                    match flatten_widget(doc, &pages, field, widget, &mut writer) {
                        Ok(flattened) => sink.widget_flattened(&flattened),
                        Err(skip) => {
                            warn!("Skipping widget of '{}': {}", field.name, skip);
                            sink.widget_skipped(&field.name, &skip);
                        }
                    }
                }
            }
            debug!("Appended flattened widgets to {} pages", writer.pages_written());

            let fields = form.fields().to_vec();
            for field in &fields {
                match form.remove_field(doc, field) {
                    Ok(()) => sink.field_removed(&field.name),
                    Err(detail) => {
                        warn!("Failed to remove field '{}': {}", field.name, detail);
                        sink.field_failed(&FieldFailure::Removal {
                            field: field.name.clone(),
                            detail,
                        });
                    }
                }
            }
        }

        document.clear_interactive_flags()?;

        info!(
            "Flattened {} widgets ({} skipped), removed {} fields, {} field failures",
            report.widgets_flattened(),
            report.widgets_skipped(),
            report.fields_removed(),
            report.failures.len()
        );
        Ok(report)
    }
}

/// Flatten a PDF held in memory with the default font source and embedder.
pub async fn flatten_pdf(bytes: Vec<u8>, config: &FlattenConfig) -> Result<Vec<u8>, FlattenError> {
    config.validate()?;
    let source = DefaultFontSource::new(config.fetch_timeout_secs)?;
    let embedder = TrueTypeEmbedder::new();
    let mut document = FormDocument::from_bytes(bytes)?;
    FormFlattener::new(&source, &embedder, config)
        .flatten(&mut document)
        .await?;
    document.save_to_bytes()
}
