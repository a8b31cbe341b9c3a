//! Page lookup for widget annotations

use crate::objects::dict_by_id;
use crate::pages::annotation_ids;
use lopdf::{Document, ObjectId};
use tracing::debug;

/// Find the page that owns `widget`.
///
/// The widget's `/P` entry wins when it names one of `pages`; otherwise every
/// page's `/Annots` is searched for the widget and the first hit returned.
pub fn find_page_for_widget(doc: &Document, pages: &[ObjectId], widget: ObjectId) -> Option<ObjectId> {
    let direct = dict_by_id(doc, widget)
        .and_then(|dict| dict.get(b"P").ok())
        .and_then(|p| p.as_reference().ok());
    if let Some(page) = direct {
        if pages.contains(&page) {
            return Some(page);
        }
        debug!("Widget {:?} points at {:?}, which is not a page", widget, page);
    }

    pages
        .iter()
        .copied()
        .find(|&page| annotation_ids(doc, page).contains(&widget))
}
