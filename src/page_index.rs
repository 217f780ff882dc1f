use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use crate::ObjectId;
use crate::object_map::ObjectEntry;

/// Assign page ownership to every entry that can be traced back to a single page.
///
/// Pages own themselves. Any other entry inherits the page of its backlink sources when
/// those sources resolve to exactly one distinct page; entries shared by several pages,
/// or reachable from none, stay unresolved. Resolved entries are never touched again.
/// Passes repeat until nothing new is assigned, so calling this again is a no-op.
///
/// Returns the number of entries that were assigned a page.
pub fn propagate(entries: &mut IndexMap<ObjectId, ObjectEntry>, pages: &[ObjectId]) -> usize {
    let mut positions = HashMap::new();
    for (index, page) in pages.iter().enumerate() {
        positions.entry(*page).or_insert(index);
    }

    let mut total = 0;
    let mut passes = 0;
    loop {
        let assigned = propagation_pass(entries, &positions);
        passes += 1;
        total += assigned;
        if assigned == 0 {
            break;
        }
    }
    debug!("page propagation assigned {} entries in {} passes", total, passes);
    total
}

/// One memoized depth-first traversal over backlink sources. Each entry is entered at most
/// once per pass; an entry already on the stack counts as unresolved for its descendants.
fn propagation_pass(entries: &mut IndexMap<ObjectId, ObjectEntry>, positions: &HashMap<ObjectId, usize>) -> usize {
    let roots: Vec<ObjectId> = entries.keys().copied().collect();
    let mut visited = HashSet::new();
    let mut assigned = 0;

    for root in roots {
        if !visited.insert(root) {
            continue;
        }
        // (entry, index of the next backlink to descend into)
        let mut stack = vec![(root, 0usize)];

        while let Some(&(id, next)) = stack.last() {
            let Some(entry) = entries.get(&id) else {
                stack.pop();
                continue;
            };
            if entry.page_index.is_some() {
                stack.pop();
                continue;
            }
            if let Some(&position) = positions.get(&id) {
                set_page(entries, id, position);
                assigned += 1;
                stack.pop();
                continue;
            }

            if let Some(backlink) = entry.backlinks.get(next) {
                let source = backlink.source;
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if entries.contains_key(&source) && visited.insert(source) {
                    stack.push((source, 0));
                }
                continue;
            }

            let owners: BTreeSet<usize> = entry
                .backlinks
                .iter()
                .filter_map(|backlink| entries.get(&backlink.source)?.page_index)
                .collect();
            if owners.len() == 1 {
                if let Some(&position) = owners.first() {
                    set_page(entries, id, position);
                    assigned += 1;
                }
            }
            stack.pop();
        }
    }
    assigned
}

fn set_page(entries: &mut IndexMap<ObjectId, ObjectEntry>, id: ObjectId, position: usize) {
    if let Some(entry) = entries.get_mut(&id) {
        entry.page_index.get_or_insert(position);
    }
}
