use std::collections::{BTreeMap, HashSet};

use log::warn;

use crate::error::ParseError;
use crate::xref::{Xref, XrefEntry};
use crate::{Dictionary, Error, Object, ObjectId, Result};

/// The parsed-document collaborator the object map is built from.
///
/// Cross-reference parsing, decryption and object parsing live behind this trait; the
/// indexer only enumerates, fetches and reads raw bytes.
pub trait ObjectSource {
    /// Cross-reference entries in ascending object number order.
    fn xref_entries(&self) -> Vec<(u32, XrefEntry)>;

    /// Dereference an indirect object. A reference cycle is reported as
    /// [`Error::ReferenceCycle`], which callers may treat as a sentinel value.
    fn fetch(&self, id: ObjectId) -> Result<Object>;

    /// The raw file the cross-reference offsets point into.
    fn raw_bytes(&self) -> &[u8];

    fn trailer(&self) -> &Dictionary;

    /// Top-level page references in document order.
    fn page_refs(&self) -> Result<Vec<ObjectId>>;
}

/// PDF document held in memory.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The trailer gives the location of the cross-reference table and of certain special objects.
    pub trailer: Dictionary,

    /// The cross-reference table contains locations of the indirect objects.
    pub reference_table: Xref,

    /// The objects that make up the document contained in the file.
    pub objects: BTreeMap<ObjectId, Object>,

    /// Raw bytes of the file the objects were read from.
    pub buffer: Vec<u8>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    /// Register an object together with its cross-reference entry.
    pub fn insert_object<T: Into<Object>>(&mut self, id: ObjectId, object: T, entry: XrefEntry) {
        self.objects.insert(id, object.into());
        self.reference_table.insert(id.0, entry);
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(&id).ok_or(Error::ObjectNotFound(id))
    }

    /// Follow reference chains until a direct object is reached.
    pub fn dereference<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        let mut current = object;
        let mut seen = HashSet::new();
        while let Object::Reference(id) = *current {
            if !seen.insert(id) {
                return Err(Error::ReferenceCycle(id));
            }
            current = self.get_object(id)?;
        }
        Ok(current)
    }

    pub fn catalog(&self) -> Result<&Dictionary> {
        self.dereference(self.trailer.get(b"Root")?)?.as_dict()
    }

    /// Depth-first walk of the page tree. Nodes that are missing, unreadable or revisited
    /// are skipped with a warning, so the rest of the tree is still collected.
    fn collect_pages(&self, node_id: ObjectId, pages: &mut Vec<ObjectId>, seen: &mut HashSet<ObjectId>) {
        if !seen.insert(node_id) {
            warn!("page tree revisits object {:?}, skipping", node_id);
            return;
        }
        let node = match self.get_object(node_id).and_then(|object| self.dereference(object)) {
            Ok(node) => node,
            Err(err) => {
                warn!("page tree node {:?} skipped: {}", node_id, err);
                return;
            }
        };
        let Some(dict) = node.dict() else {
            warn!("page tree node {:?} is not a dictionary", node_id);
            return;
        };
        if dict.type_is(b"Page") {
            pages.push(node_id);
            return;
        }

        match dict.get(b"Kids").and_then(|kids| self.dereference(kids)?.as_array()) {
            Ok(kids) => {
                for kid in kids {
                    match kid.as_reference() {
                        Ok(kid_id) => self.collect_pages(kid_id, pages, seen),
                        Err(_) => warn!("page tree node {:?} has a direct kid", node_id),
                    }
                }
            }
            // An untyped leaf is still a page.
            Err(_) if !dict.has(b"Type") => pages.push(node_id),
            Err(_) => warn!("page tree node {:?} has no Kids", node_id),
        }
    }
}

impl ObjectSource for Document {
    fn xref_entries(&self) -> Vec<(u32, XrefEntry)> {
        self.reference_table.entries.iter().map(|(n, e)| (*n, *e)).collect()
    }

    fn fetch(&self, id: ObjectId) -> Result<Object> {
        self.dereference(self.get_object(id)?).cloned()
    }

    fn raw_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    fn page_refs(&self) -> Result<Vec<ObjectId>> {
        let root = self
            .catalog()?
            .get(b"Pages")?
            .as_reference()
            .map_err(|_| ParseError::InvalidPageTree)?;
        self.get_object(root)?;
        let mut pages = Vec::new();
        self.collect_pages(root, &mut pages, &mut HashSet::new());
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn entry(offset: u32) -> XrefEntry {
        XrefEntry::Normal { offset, generation: 0 }
    }

    fn page_tree() -> Document {
        let mut doc = Document::new();
        doc.insert_object((1, 0), dictionary! { "Type" => "Catalog", "Pages" => Object::Reference((2, 0)) }, entry(0));
        doc.insert_object(
            (2, 0),
            dictionary! { "Type" => "Pages", "Kids" => vec![Object::Reference((3, 0)), Object::Reference((4, 0))], "Count" => 3 },
            entry(0),
        );
        doc.insert_object((3, 0), dictionary! { "Type" => "Page", "Parent" => Object::Reference((2, 0)) }, entry(0));
        doc.insert_object(
            (4, 0),
            dictionary! { "Type" => "Pages", "Kids" => vec![Object::Reference((5, 0)), Object::Reference((2, 0))], "Parent" => Object::Reference((2, 0)) },
            entry(0),
        );
        doc.insert_object((5, 0), dictionary! { "Type" => "Page", "Parent" => Object::Reference((4, 0)) }, entry(0));
        doc.trailer.set("Root", Object::Reference((1, 0)));
        doc
    }

    #[test]
    fn page_refs_follow_kids_in_order() {
        let doc = page_tree();
        assert_eq!(doc.page_refs().unwrap(), vec![(3, 0), (5, 0)]);
    }

    #[test]
    fn missing_kids_are_skipped() {
        let mut doc = page_tree();
        let kids = vec![Object::Reference((3, 0)), Object::Reference((99, 0))];
        doc.objects.insert((2, 0), Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids }));
        assert_eq!(doc.page_refs().unwrap(), vec![(3, 0)]);
    }

    #[test]
    fn pages_node_without_kids_is_not_a_page() {
        let mut doc = page_tree();
        doc.objects.insert((2, 0), Object::Dictionary(dictionary! { "Type" => "Pages", "Count" => 0 }));
        assert!(doc.page_refs().unwrap().is_empty());

        let media_box: Vec<Object> = [0, 0, 612, 792].into_iter().map(Object::Integer).collect();
        doc.objects.insert((2, 0), Object::Dictionary(dictionary! { "MediaBox" => media_box }));
        assert_eq!(doc.page_refs().unwrap(), vec![(2, 0)]);
    }

    #[test]
    fn missing_page_tree_root_is_an_error() {
        let mut doc = page_tree();
        doc.objects.remove(&(2, 0));
        assert!(matches!(doc.page_refs(), Err(Error::ObjectNotFound((2, 0)))));
    }

    #[test]
    fn fetch_reports_reference_cycles() {
        let mut doc = Document::new();
        doc.insert_object((1, 0), Object::Reference((2, 0)), entry(0));
        doc.insert_object((2, 0), Object::Reference((1, 0)), entry(0));
        assert!(matches!(doc.fetch((1, 0)), Err(Error::ReferenceCycle(_))));
        assert!(matches!(doc.fetch((9, 0)), Err(Error::ObjectNotFound((9, 0)))));
    }
}
