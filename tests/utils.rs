use std::io::Write;

use pdf_inspect::{Document, Object, ObjectId, Stream, XrefEntry, dictionary};

#[allow(dead_code)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds an in-memory document whose raw buffer holds a real `N G obj ... endobj`
/// definition for every file-resident object, at the offset its xref entry points to.
#[allow(dead_code)]
pub struct DocumentBuilder {
    doc: Document,
    buffer: Vec<u8>,
}

#[allow(dead_code)]
impl DocumentBuilder {
    pub fn new() -> DocumentBuilder {
        DocumentBuilder {
            doc: Document::new(),
            buffer: b"%PDF-1.7\n".to_vec(),
        }
    }

    pub fn object<T: Into<Object>>(mut self, id: ObjectId, object: T) -> DocumentBuilder {
        let object = object.into();
        let offset = self.buffer.len() as u32;
        write!(self.buffer, "{} {} obj\n{:?}\nendobj\n", id.0, id.1, object).unwrap();
        self.doc.insert_object(
            id,
            object,
            XrefEntry::Normal {
                offset,
                generation: id.1,
            },
        );
        self
    }

    /// Object stream `container` holding `members` as (number, body) pairs, with `First`
    /// padded to `first`.
    pub fn object_stream(mut self, container: u32, first: usize, members: &[(u32, Object)]) -> DocumentBuilder {
        let mut header = Vec::new();
        let mut bodies = Vec::new();
        for (index, (number, object)) in members.iter().enumerate() {
            write!(header, "{} {} ", number, bodies.len()).unwrap();
            write!(bodies, "{:?} ", object).unwrap();
            self.doc.objects.insert((*number, 0), object.clone());
            self.doc.reference_table.insert(
                *number,
                XrefEntry::Compressed {
                    container,
                    index: index as u16,
                },
            );
        }
        assert!(header.len() <= first, "header does not fit before First");
        header.resize(first, b' ');
        header.extend(bodies);

        let dict = dictionary! { "Type" => "ObjStm", "N" => members.len() as i64, "First" => first as i64 };
        self.object((container, 0), Stream::new(dict, header))
    }

    pub fn trailer(mut self, key: &str, value: Object) -> DocumentBuilder {
        self.doc.trailer.set(key, value);
        self
    }

    pub fn build(mut self) -> Document {
        self.doc.buffer = self.buffer;
        self.doc
    }
}

/// Catalog 1, page tree 2 and one page per entry of `pages`, each with the given extra entries.
#[allow(dead_code)]
pub fn with_pages(builder: DocumentBuilder, pages: &[(u32, Vec<(&str, Object)>)]) -> DocumentBuilder {
    let kids: Vec<Object> = pages.iter().map(|(number, _)| Object::Reference((*number, 0))).collect();
    let count = kids.len() as i64;
    let mut builder = builder
        .object((1, 0), dictionary! { "Type" => "Catalog", "Pages" => Object::Reference((2, 0)) })
        .object((2, 0), dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count })
        .trailer("Root", Object::Reference((1, 0)));
    for (number, extra) in pages {
        let mut page = dictionary! { "Type" => "Page", "Parent" => Object::Reference((2, 0)) };
        for (key, value) in extra {
            page.set(*key, value.clone());
        }
        builder = builder.object((*number, 0), page);
    }
    builder
}
