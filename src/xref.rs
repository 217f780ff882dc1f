use std::collections::BTreeMap;

/// Cross-reference table as handed over by the document model.
#[derive(Debug, Clone, Default)]
pub struct Xref {
    /// Entries for normal and compressed objects.
    pub entries: BTreeMap<u32, XrefEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Free,
    UnusableFree,
    /// Object stored directly in the file at `offset`.
    Normal { offset: u32, generation: u16 },
    /// Object stored as the `index`-th member of object stream `container`.
    Compressed { container: u32, index: u16 },
}

impl XrefEntry {
    pub fn is_live(&self) -> bool {
        matches!(self, XrefEntry::Normal { .. } | XrefEntry::Compressed { .. })
    }
}

impl Xref {
    pub fn insert(&mut self, id: u32, entry: XrefEntry) {
        self.entries.insert(id, entry);
    }
}
