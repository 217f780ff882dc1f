use std::collections::BTreeSet;
use std::ops::Range;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::content::Content;
use crate::document::ObjectSource;
use crate::object_stream::ObjectStreamLayout;
use crate::xref::XrefEntry;
use crate::{Error, Object, ObjectId, Result, backlinks, page_index};
use crate::{parse_reference_key, reference_key};

/// Byte range given to object stream members until the container header is read.
pub const PLACEHOLDER_RANGE: Range<usize> = 0..1;

const ENDOBJ: &[u8] = b"endobj";

/// A reference to an entry found in another entry's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backlink {
    /// The entry whose value holds the reference.
    pub source: ObjectId,
    /// Key of the dictionary directly holding the reference, if any.
    pub hint: Option<Vec<u8>>,
}

impl Backlink {
    pub fn hint_str(&self) -> Option<&str> {
        self.hint.as_deref().and_then(|hint| std::str::from_utf8(hint).ok())
    }
}

/// One indirect object of a document together with everything known about its place in the file.
#[derive(Debug, Clone)]
pub struct ObjectEntry {
    pub id: ObjectId,
    /// The dereferenced value; streams are already decompressed where possible.
    pub value: Object,
    /// The object stream holding this object, `None` when it sits directly in the file.
    pub container: Option<ObjectId>,
    pub name_hint: Option<String>,
    pub page_index: Option<usize>,
    pub backlinks: Vec<Backlink>,
    /// Span of the object's definition, in the raw file or in the container's decoded payload.
    pub byte_range: Range<usize>,
    /// Fetching the value ran into a reference cycle; `value` is `Null`.
    pub circular: bool,
}

impl ObjectEntry {
    pub fn new(id: ObjectId, value: Object) -> ObjectEntry {
        ObjectEntry {
            id,
            value,
            container: None,
            name_hint: None,
            page_index: None,
            backlinks: Vec::new(),
            byte_range: PLACEHOLDER_RANGE,
            circular: false,
        }
    }

    /// Canonical reference string of this entry.
    pub fn key(&self) -> String {
        reference_key(self.id)
    }

    /// Decode the entry's stream as a content stream.
    pub fn decode_content(&self) -> Result<Content> {
        self.value.as_stream()?.decode_content()
    }

    /// Bytes of the object definition: a slice of `raw` for file objects, of the container
    /// payload for object stream members.
    pub fn definition<'a>(&self, map: &'a ObjectMap, raw: &'a [u8]) -> Option<&'a [u8]> {
        match self.container {
            None => raw.get(self.byte_range.clone()),
            Some(container) => map
                .get(container)?
                .value
                .as_stream()
                .ok()?
                .content
                .get(self.byte_range.clone()),
        }
    }
}

/// Every indirect object of a document, indexed by reference.
#[derive(Debug, Clone, Default)]
pub struct ObjectMap {
    entries: IndexMap<ObjectId, ObjectEntry>,
    pages: Vec<ObjectId>,
}

impl ObjectMap {
    pub fn get(&self, id: ObjectId) -> Option<&ObjectEntry> {
        self.entries.get(&id)
    }

    /// Look an entry up by its canonical reference string, e.g. `"12R"`.
    pub fn get_by_key(&self, key: &str) -> Option<&ObjectEntry> {
        self.get(parse_reference_key(key).ok()?)
    }

    pub fn values(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.entries.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, ObjectId, ObjectEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.keys().map(|id| reference_key(*id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level pages in document order.
    pub fn pages(&self) -> &[ObjectId] {
        &self.pages
    }

    /// Entries owned by the page at `index`.
    pub fn page_objects(&self, index: usize) -> impl Iterator<Item = &ObjectEntry> {
        self.values().filter(move |entry| entry.page_index == Some(index))
    }

    /// Run page ownership propagation again. Already resolved entries keep their page.
    pub fn propagate_page_indices(&mut self) -> usize {
        page_index::propagate(&mut self.entries, &self.pages)
    }
}

impl<'a> IntoIterator for &'a ObjectMap {
    type Item = (&'a ObjectId, &'a ObjectEntry);
    type IntoIter = indexmap::map::Iter<'a, ObjectId, ObjectEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// From the start of an object definition to just past its `endobj`.
fn file_range(raw: &[u8], offset: usize, id: ObjectId) -> Range<usize> {
    let start = offset.min(raw.len());
    if offset > raw.len() {
        warn!("object {:?} offset {} lies past the end of the file", id, offset);
    }
    match raw[start..].windows(ENDOBJ.len()).position(|window| window == ENDOBJ) {
        Some(position) => start..start + position + ENDOBJ.len(),
        None => {
            warn!("object {:?} has no endobj, using the rest of the file", id);
            start..raw.len()
        }
    }
}

/// Index every live object of `source`: values, byte ranges, object stream membership,
/// backlinks, the `Info` name hint and page ownership.
///
/// Malformed data degrades to fallbacks with a warning. Only `fetch` errors other than
/// reference cycles abort the build.
pub fn build_object_map<S: ObjectSource + ?Sized>(source: &S) -> Result<ObjectMap> {
    let raw = source.raw_bytes();
    let mut entries = IndexMap::new();

    for (number, xref_entry) in source.xref_entries() {
        if number == 0 || !xref_entry.is_live() {
            continue;
        }
        let (id, container, byte_range) = match xref_entry {
            XrefEntry::Normal { offset, generation } => {
                let id = (number, generation);
                (id, None, file_range(raw, offset as usize, id))
            }
            XrefEntry::Compressed { container, .. } => ((number, 0), Some((container, 0)), PLACEHOLDER_RANGE),
            XrefEntry::Free | XrefEntry::UnusableFree => continue,
        };

        let (value, circular) = match source.fetch(id) {
            Ok(mut value) => {
                if let Object::Stream(stream) = &mut value {
                    stream.decompress();
                }
                (value, false)
            }
            Err(Error::ReferenceCycle(at)) => {
                warn!("object {:?} runs into a reference cycle at {:?}", id, at);
                (Object::Null, true)
            }
            Err(err) => return Err(err),
        };

        entries.insert(
            id,
            ObjectEntry {
                container,
                byte_range,
                circular,
                ..ObjectEntry::new(id, value)
            },
        );
    }
    debug!("materialized {} objects", entries.len());

    correct_member_ranges(&mut entries);
    backlinks::link(&mut entries);

    match source.trailer().get(b"Info").and_then(Object::as_reference) {
        Ok(info) => match entries.get_mut(&info) {
            Some(entry) => entry.name_hint = Some("Info".to_string()),
            None => warn!("trailer Info {:?} is not in the cross-reference table", info),
        },
        Err(_) => debug!("trailer has no Info reference"),
    }

    let pages = source.page_refs().unwrap_or_else(|err| {
        warn!("page tree unavailable, page ownership left unresolved: {}", err);
        Vec::new()
    });
    let mut map = ObjectMap { entries, pages };
    map.propagate_page_indices();
    Ok(map)
}

/// Replace the placeholder range of every object stream member with its span inside the
/// container's decoded payload.
fn correct_member_ranges(entries: &mut IndexMap<ObjectId, ObjectEntry>) {
    let containers: BTreeSet<ObjectId> = entries.values().filter_map(|entry| entry.container).collect();
    let mut updates = Vec::new();

    for container in containers {
        let Some(container_entry) = entries.get(&container) else {
            warn!("object stream {:?} is not in the cross-reference table", container);
            continue;
        };
        let layout = match ObjectStreamLayout::try_from(&container_entry.value) {
            Ok(layout) => layout,
            Err(err) => {
                warn!("object stream {:?} is unreadable: {}", container, err);
                continue;
            }
        };

        for member in entries.values().filter(|entry| entry.container == Some(container)) {
            match layout.range_of(member.id.0) {
                Some(range) => updates.push((member.id, range)),
                None => warn!("object {:?} is missing from the header of object stream {:?}", member.id, container),
            }
        }
    }

    for (id, range) in updates {
        if let Some(entry) = entries.get_mut(&id) {
            entry.byte_range = range;
        }
    }
}
