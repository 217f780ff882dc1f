#![doc = include_str!("../README.md")]

mod object;
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat, parse_reference_key, reference_key};

mod document;
pub use document::{Document, ObjectSource};

pub mod xref;
pub use xref::{Xref, XrefEntry};

pub mod content;
pub use content::{Content, Operand, Operation, parse_content_stream};

mod parser;
pub use parser::MAX_NESTING;

mod writer;
pub use writer::{disabled_closure, print_operand, serialize_with_disabled_operators};

pub mod operators;
pub use operators::{OperatorCategory, OperatorDoc, lookup_operator_doc};

pub mod object_stream;
pub use object_stream::ObjectStreamLayout;

mod backlinks;
pub use backlinks::scan_references;

mod page_index;

mod object_map;
pub use object_map::{Backlink, ObjectEntry, ObjectMap, PLACEHOLDER_RANGE, build_object_map};

mod error;
pub use error::{DecompressError, Error, ParseError, Result};

pub mod filters {
    pub mod png;
}
