use std::fmt;

use indexmap::IndexMap;
use log::warn;

use crate::operators;
use crate::parser::{self, ParserInput, Token};
use crate::writer;
use crate::{Result, Stream};

/// Opcode of the pseudo-operator that carries operands no operator consumed.
pub const DANGLING_OPERANDS: &str = "%dangling";

/// A value on the operand stack of a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Bool(bool),
    Null,
    Name(Vec<u8>),
    /// Literal string, exactly as written between the parentheses (escapes undecoded).
    String(Vec<u8>),
    Hex(Vec<u8>),
    Array(Vec<Operand>),
    Dict(IndexMap<Vec<u8>, Operand>),
    /// Raw inline image data.
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Number of `q`, `BT`, `BDC` and `BMC` scopes still open around this operator.
    pub depth: usize,
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl Operation {
    pub fn new(operator: &str, operands: Vec<Operand>) -> Operation {
        Operation {
            depth: 0,
            operator: operator.to_string(),
            operands,
        }
    }

    pub fn is_dangling(&self) -> bool {
        self.operator == DANGLING_OPERANDS
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str("  ")?;
        }
        for operand in &self.operands {
            write!(f, "{} ", writer::print_operand(operand))?;
        }
        f.write_str(&self.operator)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    pub operations: Vec<Operation>,
}

pub fn is_scope_opener(operator: &str) -> bool {
    matches!(operator, "q" | "BT" | "BDC" | "BMC")
}

pub fn is_scope_closer(operator: &str) -> bool {
    matches!(operator, "Q" | "ET" | "EMC")
}

/// A keyword counts as an operator when it is a known opcode or looks like one:
/// one to four letters, `*`, `'` or `"`.
pub fn is_operator(word: &[u8]) -> bool {
    let looks_like_operator = (1..=4).contains(&word.len())
        && word.iter().all(|&c| c.is_ascii_alphabetic() || b"*'\"".contains(&c));
    looks_like_operator || std::str::from_utf8(word).is_ok_and(|op| operators::lookup_operator_doc(op).is_some())
}

/// Drains the operand stack into operators and tracks scope depth.
#[derive(Default)]
struct Assembler {
    operations: Vec<Operation>,
    stack: Vec<Operand>,
    depth: usize,
}

impl Assembler {
    fn push_operator(&mut self, operator: &str) {
        if is_scope_closer(operator) {
            self.depth = self.depth.saturating_sub(1);
        }
        let operands = std::mem::take(&mut self.stack);
        self.operations.push(Operation {
            depth: self.depth,
            operator: operator.to_string(),
            operands,
        });
        if is_scope_opener(operator) {
            self.depth += 1;
        }
    }

    fn flush_dangling(&mut self) {
        if !self.stack.is_empty() {
            warn!("{} operands not consumed by any operator", self.stack.len());
            self.push_operator(DANGLING_OPERANDS);
        }
    }

    fn push_inline_image(&mut self, image: parser::InlineImage) {
        self.stack.push(Operand::Dict(image.dict));
        self.push_operator("BI");
        self.stack.push(Operand::Bytes(image.data));
        self.push_operator("ID");
        self.push_operator("EI");
    }
}

impl Content {
    /// Decode content operations.
    ///
    /// Malformed data stops the decoding; whatever was decoded before it is kept. Only a
    /// broken inline image fails the whole call.
    pub fn decode(data: &[u8]) -> Result<Content> {
        let mut input = ParserInput::new_extra(data, "content operations");
        let mut assembler = Assembler::default();

        loop {
            let (rest, token) = match parser::next_token(input) {
                Ok((_, None)) => break,
                Ok((rest, Some(token))) => (rest, token),
                Err(_) => {
                    warn!("malformed content stream data at offset {}", input.location_offset());
                    break;
                }
            };
            input = rest;

            match token {
                Token::Operand(operand) => assembler.stack.push(operand),
                Token::Keyword(word) if word == b"BI" => {
                    assembler.flush_dangling();
                    let (rest, image) = parser::inline_image(input)?;
                    assembler.push_inline_image(image);
                    input = rest;
                }
                Token::Keyword(word) if is_operator(&word) => {
                    assembler.push_operator(&String::from_utf8_lossy(&word));
                }
                Token::Keyword(word) => assembler.stack.push(Operand::String(word)),
            }
        }

        assembler.flush_dangling();
        Ok(Content {
            operations: assembler.operations,
        })
    }

    /// Opcodes in stream order.
    pub fn operators(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.operator.as_str()).collect()
    }

    /// Indented, one operator per line listing.
    pub fn render(&self) -> String {
        let lines: Vec<String> = self.operations.iter().map(ToString::to_string).collect();
        lines.join("\n")
    }

    /// Write the stream back, leaving out the operators at `disabled` and whatever they drag along.
    pub fn encode_with_disabled(&self, disabled: &[usize]) -> Vec<u8> {
        writer::serialize_with_disabled_operators(&self.operations, disabled)
    }

    pub fn encode(&self) -> Vec<u8> {
        self.encode_with_disabled(&[])
    }
}

impl Stream {
    /// Decode content after all stream filters were removed.
    pub fn decode_content(&self) -> Result<Content> {
        Content::decode(&self.content)
    }
}

/// Parse one decompressed content stream into operators.
pub fn parse_content_stream(data: &[u8]) -> Result<Vec<Operation>> {
    Content::decode(data).map(|content| content.operations)
}
