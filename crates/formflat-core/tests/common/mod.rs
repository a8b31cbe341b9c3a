//! Shared builders and mocks for the flattening integration tests

#![allow(dead_code)]

use formflat_core::{EmbedOptions, EmbeddedFont, FlattenError, FontEmbedder, FontSource, Glyph};
use futures::future::{BoxFuture, FutureExt};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::sync::Mutex;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn text(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

pub fn name(s: &str) -> Object {
    Object::Name(s.as_bytes().to_vec())
}

/// `/AP` whose normal appearance is `normal`.
pub fn appearance(normal: Object) -> Object {
    Object::Dictionary(Dictionary::from_iter(vec![("N", normal)]))
}

/// State dictionary mapping each name to a stream reference.
pub fn states(entries: Vec<(&str, ObjectId)>) -> Object {
    Object::Dictionary(Dictionary::from_iter(
        entries.into_iter().map(|(key, id)| (key, Object::Reference(id))),
    ))
}

/// `[x y x+w y+h]`
pub fn rect(x: i64, y: i64, w: i64, h: i64) -> Object {
    Object::Array(vec![
        Object::Integer(x),
        Object::Integer(y),
        Object::Integer(x + w),
        Object::Integer(y + h),
    ])
}

/// In-memory document with a page tree and an AcroForm.
pub struct FormBuilder {
    pub doc: Document,
    pub pages: Vec<ObjectId>,
    pub catalog: ObjectId,
    pub acroform: ObjectId,
}

impl FormBuilder {
    pub fn new(page_count: usize) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut pages = Vec::new();
        for i in 0..page_count {
            let content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", i + 1);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", name("Page")),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array([0, 0, 612, 792].iter().map(|v| Object::Integer(*v)).collect()),
                ),
                ("Contents", Object::Reference(content_id)),
            ]));
            pages.push(page_id);
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", name("Pages")),
                ("Count", Object::Integer(page_count as i64)),
                (
                    "Kids",
                    Object::Array(pages.iter().map(|id| Object::Reference(*id)).collect()),
                ),
            ])),
        );

        let acroform = doc.add_object(Dictionary::from_iter(vec![
            ("Fields", Object::Array(vec![])),
            ("DA", text("/Helv 0 Tf 0 g")),
            ("NeedAppearances", Object::Boolean(true)),
        ]));
        let catalog = doc.add_object(Dictionary::from_iter(vec![
            ("Type", name("Catalog")),
            ("Pages", Object::Reference(pages_id)),
            ("AcroForm", Object::Reference(acroform)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog));

        Self {
            doc,
            pages,
            catalog,
            acroform,
        }
    }

    /// A terminal field merged with its single widget, placed on `page`.
    pub fn add_field(&mut self, page: usize, entries: Vec<(&str, Object)>) -> ObjectId {
        let page_id = self.pages[page];
        let mut dict = Dictionary::from_iter(entries);
        dict.set("Type", name("Annot"));
        dict.set("Subtype", name("Widget"));
        if !dict.has(b"P") {
            dict.set("P", Object::Reference(page_id));
        }
        let id = self.doc.add_object(dict);
        self.list_annotation(page, id);
        self.doc
            .get_dictionary_mut(self.acroform)
            .unwrap()
            .get_mut(b"Fields")
            .unwrap()
            .as_array_mut()
            .unwrap()
            .push(Object::Reference(id));
        id
    }

    /// A terminal field whose widgets are separate kids, all placed on
    /// `page`. Returns the field id and the widget ids in order.
    pub fn add_field_with_widgets(
        &mut self,
        page: usize,
        entries: Vec<(&str, Object)>,
        widgets: Vec<Vec<(&str, Object)>>,
    ) -> (ObjectId, Vec<ObjectId>) {
        let page_id = self.pages[page];
        let field_id = self.doc.new_object_id();
        let mut widget_ids = Vec::new();
        for entries in widgets {
            let mut dict = Dictionary::from_iter(entries);
            dict.set("Type", name("Annot"));
            dict.set("Subtype", name("Widget"));
            dict.set("Parent", Object::Reference(field_id));
            dict.set("P", Object::Reference(page_id));
            let id = self.doc.add_object(dict);
            self.list_annotation(page, id);
            widget_ids.push(id);
        }
        let mut field = Dictionary::from_iter(entries);
        field.set(
            "Kids",
            Object::Array(widget_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        self.doc.objects.insert(field_id, Object::Dictionary(field));
        self.doc
            .get_dictionary_mut(self.acroform)
            .unwrap()
            .get_mut(b"Fields")
            .unwrap()
            .as_array_mut()
            .unwrap()
            .push(Object::Reference(field_id));
        (field_id, widget_ids)
    }

    pub fn list_annotation(&mut self, page: usize, annot: ObjectId) {
        let page = self.doc.get_dictionary_mut(self.pages[page]).unwrap();
        if !page.has(b"Annots") {
            page.set("Annots", Object::Array(vec![]));
        }
        page.get_mut(b"Annots")
            .unwrap()
            .as_array_mut()
            .unwrap()
            .push(Object::Reference(annot));
    }

    pub fn add_stream(&mut self, content: &[u8]) -> ObjectId {
        let dict = Dictionary::from_iter(vec![
            ("Type", name("XObject")),
            ("Subtype", name("Form")),
            (
                "BBox",
                Object::Array([0, 0, 20, 20].iter().map(|v| Object::Integer(*v)).collect()),
            ),
        ]);
        self.doc.add_object(Stream::new(dict, content.to_vec()))
    }

    pub fn set_catalog(&mut self, key: &str, value: Object) {
        self.doc.get_dictionary_mut(self.catalog).unwrap().set(key, value);
    }

    pub fn build(self) -> Document {
        self.doc
    }
}

/// Serves fixed bytes for any location and records what was asked for.
#[derive(Default)]
pub struct MockFontSource {
    pub fail: bool,
    pub requests: Mutex<Vec<String>>,
}

impl MockFontSource {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl FontSource for MockFontSource {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FlattenError>> {
        async move {
            self.requests.lock().unwrap().push(location.to_string());
            if self.fail {
                return Err(FlattenError::FontFetch {
                    location: location.to_string(),
                    reason: "HTTP 503".to_string(),
                });
            }
            Ok(b"mock font program".to_vec())
        }
        .boxed()
    }
}

/// Writes a simple font object and maps every requested character to a
/// two-byte code with a fixed width.
#[derive(Default)]
pub struct MockEmbedder {
    pub calls: Mutex<Vec<EmbedOptions>>,
}

impl MockEmbedder {
    pub fn calls(&self) -> Vec<EmbedOptions> {
        self.calls.lock().unwrap().clone()
    }
}

impl FontEmbedder for MockEmbedder {
    fn embed(
        &self,
        doc: &mut Document,
        _bytes: &[u8],
        options: EmbedOptions,
        text: &str,
    ) -> Result<EmbeddedFont, FlattenError> {
        self.calls.lock().unwrap().push(options);
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", name("Font")),
            ("Subtype", name("Type0")),
            ("BaseFont", name("MockSans")),
        ]));
        let mut font = EmbeddedFont::new(font_id, "MockSans", 800.0, -200.0, true);
        let printable = (0x20u8..0x7f).map(char::from);
        for (i, ch) in printable.chain(text.chars()).enumerate() {
            if !font.has_glyph(ch) {
                font.insert_glyph(
                    ch,
                    Glyph {
                        code: i as u16 + 1,
                        width: if is_wide(ch) { 1000.0 } else { 500.0 },
                    },
                );
            }
        }
        Ok(font)
    }
}

fn is_wide(ch: char) -> bool {
    formflat_core::is_cjk(ch)
}
