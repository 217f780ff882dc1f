use std::collections::BTreeSet;
use std::io::{Result, Write};

use log::warn;

use crate::content::{Operand, Operation, is_operator, is_scope_closer, is_scope_opener};
use crate::parser::{is_regular, literal_word};

/// Render an operand as compact PDF syntax for display. Inline image data is summarised.
pub fn print_operand(operand: &Operand) -> String {
    match operand {
        Operand::String(text) => format!("({})", String::from_utf8_lossy(text)),
        Operand::Bytes(data) => format!("<{} bytes>", data.len()),
        Operand::Array(items) => {
            let items: Vec<String> = items.iter().map(print_operand).collect();
            format!("[{}]", items.join(" "))
        }
        Operand::Dict(dict) => {
            let entries: Vec<String> = dict
                .iter()
                .map(|(key, value)| format!("{} {}", print_name(key), print_operand(value)))
                .collect();
            format!("<<{}>>", entries.join(" "))
        }
        _ => {
            let mut out = Vec::new();
            let _ = Writer::write_operand(&mut out, operand);
            String::from_utf8_lossy(&out).into_owned()
        }
    }
}

fn print_name(name: &[u8]) -> String {
    let mut out = Vec::new();
    let _ = Writer::write_name(&mut out, name);
    String::from_utf8_lossy(&out).into_owned()
}

/// Start index of the `BI`/`ID`/`EI` triple that contains `index`, if any.
fn inline_image_start(operations: &[Operation], index: usize) -> Option<usize> {
    (index.saturating_sub(2)..=index).find(|&start| is_inline_image_at(operations, start) && index < start + 3)
}

fn is_inline_image_at(operations: &[Operation], start: usize) -> bool {
    let operators = operations.get(start..start + 3).map(|ops| [&ops[0], &ops[1], &ops[2]]);
    matches!(operators, Some([bi, id, ei]) if bi.operator == "BI" && id.operator == "ID" && ei.operator == "EI")
}

/// Every operator index that disappears when the operators at `disabled` are switched off.
///
/// A disabled scope opener takes everything up to and including the first later closer at
/// its own depth (or the rest of the stream). Any member of an inline image takes the whole
/// image, plus the dangling operands flushed right before it.
pub fn disabled_closure(operations: &[Operation], disabled: &[usize]) -> BTreeSet<usize> {
    let mut closure = BTreeSet::new();
    for &index in disabled {
        let Some(operation) = operations.get(index) else {
            warn!("disabled operator index {} is out of range", index);
            continue;
        };

        if let Some(start) = inline_image_start(operations, index) {
            closure.extend(start..start + 3);
            if start > 0 && operations[start - 1].is_dangling() {
                closure.insert(start - 1);
            }
        } else if is_scope_opener(&operation.operator) {
            let end = operations[index + 1..]
                .iter()
                .position(|op| op.depth == operation.depth && is_scope_closer(&op.operator))
                .map_or(operations.len() - 1, |offset| index + 1 + offset);
            closure.extend(index..=end);
        } else {
            closure.insert(index);
        }
    }
    closure
}

/// Re-encode a parsed content stream without the disabled operators.
pub fn serialize_with_disabled_operators(operations: &[Operation], disabled: &[usize]) -> Vec<u8> {
    let skipped = disabled_closure(operations, disabled);
    let mut out = Vec::new();
    let _ = Writer::write_operations(&mut out, operations, &skipped);
    out
}

/// Whether `text` reads back as the same raw body when wrapped in parentheses.
fn is_balanced_literal(text: &[u8]) -> bool {
    let mut depth = 0usize;
    let mut bytes = text.iter();
    while let Some(&byte) = bytes.next() {
        match byte {
            b'\\' => {
                if bytes.next().is_none() {
                    return false;
                }
            }
            b'(' => depth += 1,
            b')' => match depth.checked_sub(1) {
                Some(outer) => depth = outer,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// Whether `text` reads back as the same bare-word string operand.
fn is_bare_word(text: &[u8]) -> bool {
    !text.is_empty() && text.iter().all(|&byte| is_regular(byte)) && !is_operator(text) && literal_word(text).is_none()
}

pub struct Writer;

impl Writer {
    fn write_operations(file: &mut dyn Write, operations: &[Operation], skipped: &BTreeSet<usize>) -> Result<()> {
        let mut first = true;
        let mut index = 0;
        while index < operations.len() {
            if skipped.contains(&index) {
                index += 1;
                continue;
            }
            if !first {
                file.write_all(b"\n")?;
            }
            first = false;

            if is_inline_image_at(operations, index) {
                Writer::write_inline_image(file, &operations[index], &operations[index + 1])?;
                index += 3;
            } else {
                Writer::write_operation(file, &operations[index])?;
                index += 1;
            }
        }
        Ok(())
    }

    fn write_operation(file: &mut dyn Write, operation: &Operation) -> Result<()> {
        for (i, operand) in operation.operands.iter().enumerate() {
            if i > 0 {
                file.write_all(b" ")?;
            }
            Writer::write_operand(file, operand)?;
        }
        if operation.is_dangling() {
            return Ok(());
        }
        if !operation.operands.is_empty() {
            file.write_all(b" ")?;
        }
        file.write_all(operation.operator.as_bytes())
    }

    fn write_inline_image(file: &mut dyn Write, begin: &Operation, data: &Operation) -> Result<()> {
        file.write_all(b"BI")?;
        for operand in &begin.operands {
            if let Operand::Dict(dict) = operand {
                for (key, value) in dict {
                    file.write_all(b" ")?;
                    Writer::write_name(file, key)?;
                    file.write_all(b" ")?;
                    Writer::write_operand(file, value)?;
                }
            }
        }
        file.write_all(b" ID ")?;
        for operand in &data.operands {
            if let Operand::Bytes(bytes) = operand {
                file.write_all(bytes)?;
            }
        }
        file.write_all(b" EI")
    }

    pub fn write_operand(file: &mut dyn Write, operand: &Operand) -> Result<()> {
        match operand {
            Operand::Number(value) => write!(file, "{}", value),
            Operand::Bool(value) => write!(file, "{}", value),
            Operand::Null => file.write_all(b"null"),
            Operand::Name(name) => Writer::write_name(file, name),
            Operand::String(text) => Writer::write_string(file, text),
            Operand::Hex(bytes) => {
                file.write_all(b"<")?;
                for &byte in bytes {
                    write!(file, "{:02X}", byte)?;
                }
                file.write_all(b">")
            }
            Operand::Array(items) => {
                file.write_all(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        file.write_all(b" ")?;
                    }
                    Writer::write_operand(file, item)?;
                }
                file.write_all(b"]")
            }
            Operand::Dict(dict) => {
                file.write_all(b"<<")?;
                for (i, (key, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        file.write_all(b" ")?;
                    }
                    Writer::write_name(file, key)?;
                    file.write_all(b" ")?;
                    Writer::write_operand(file, value)?;
                }
                file.write_all(b">>")
            }
            Operand::Bytes(bytes) => file.write_all(bytes),
        }
    }

    /// Raw literal bodies go back between parentheses untouched. A bare word that would not
    /// survive that, such as `x\`, is written bare; anything else is escaped.
    fn write_string(file: &mut dyn Write, text: &[u8]) -> Result<()> {
        if is_balanced_literal(text) {
            file.write_all(b"(")?;
            file.write_all(text)?;
            return file.write_all(b")");
        }
        if is_bare_word(text) {
            return file.write_all(text);
        }
        file.write_all(b"(")?;
        for &byte in text {
            if matches!(byte, b'(' | b')' | b'\\') {
                file.write_all(b"\\")?;
            }
            file.write_all(&[byte])?;
        }
        file.write_all(b")")
    }

    fn write_name(file: &mut dyn Write, name: &[u8]) -> Result<()> {
        file.write_all(b"/")?;
        for &byte in name {
            if b" \t\n\r\x0C()<>[]{}/%#".contains(&byte) || !(0x21..=0x7E).contains(&byte) {
                write!(file, "#{:02X}", byte)?;
            } else {
                file.write_all(&[byte])?;
            }
        }
        Ok(())
    }
}
