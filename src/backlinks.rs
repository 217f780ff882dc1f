use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use crate::object_map::{Backlink, ObjectEntry};
use crate::{Dictionary, Object, ObjectId};

/// References embedded in a value, in depth-first order, each with the key of the
/// dictionary that holds it directly. References inside arrays carry no key; stream
/// content is never scanned, only the stream dictionary.
pub fn scan_references(value: &Object) -> Vec<(ObjectId, Option<Vec<u8>>)> {
    let mut found = Vec::new();
    let mut stack: Vec<(&Object, Option<&[u8]>)> = vec![(value, None)];

    while let Some((object, key)) = stack.pop() {
        match object {
            Object::Reference(id) => found.push((*id, key.map(<[u8]>::to_vec))),
            Object::Array(items) => stack.extend(items.iter().rev().map(|item| (item, None))),
            Object::Dictionary(dict) => push_entries(&mut stack, dict),
            Object::Stream(stream) => push_entries(&mut stack, &stream.dict),
            _ => {}
        }
    }
    found
}

fn push_entries<'a>(stack: &mut Vec<(&'a Object, Option<&'a [u8]>)>, dict: &'a Dictionary) {
    let entries: Vec<_> = dict.iter().map(|(key, value)| (value, Some(key.as_slice()))).collect();
    stack.extend(entries.into_iter().rev());
}

/// Fill every entry's backlinks from the references found in all other values.
///
/// Sources are visited in map order, so each backlink list is ordered by source. A source
/// that references the same target several times contributes one backlink, carrying the
/// first key it was found under. Targets missing from the map are ignored.
pub fn link(entries: &mut IndexMap<ObjectId, ObjectEntry>) {
    let mut edges = Vec::new();
    for (source, entry) in entries.iter() {
        for (target, hint) in scan_references(&entry.value) {
            edges.push((*source, target, hint));
        }
    }

    let mut seen = HashSet::new();
    let mut count = 0;
    for (source, target, hint) in edges {
        let Some(target_entry) = entries.get_mut(&target) else {
            continue;
        };
        if seen.insert((source, target)) {
            target_entry.backlinks.push(Backlink { source, hint });
            count += 1;
        }
    }
    debug!("linked {} backlinks across {} objects", count, entries.len());
}
