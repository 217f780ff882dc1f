/// Broad grouping of content stream operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Path,
    Paint,
    Color,
    State,
    Text,
    ShowText,
    Image,
    MarkedContent,
}

/// Human readable documentation for one content stream operator.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDoc {
    pub opcode: &'static str,
    pub description: &'static str,
    pub detail: Option<&'static str>,
    /// Operand names in stack order.
    pub operands: &'static [&'static str],
    pub category: OperatorCategory,
}

macro_rules! op {
    ($opcode:literal, $category:ident, $description:literal, [$($operand:literal),*]) => {
        OperatorDoc {
            opcode: $opcode,
            description: $description,
            detail: None,
            operands: &[$($operand),*],
            category: OperatorCategory::$category,
        }
    };
    ($opcode:literal, $category:ident, $description:literal, [$($operand:literal),*], $detail:literal) => {
        OperatorDoc {
            opcode: $opcode,
            description: $description,
            detail: Some($detail),
            operands: &[$($operand),*],
            category: OperatorCategory::$category,
        }
    };
}

static OPERATORS: &[OperatorDoc] = &[
    // Path construction
    op!("m", Path, "Begin a new subpath", ["x", "y"]),
    op!("l", Path, "Append a straight line segment", ["x", "y"]),
    op!("c", Path, "Append a cubic Bezier curve", ["x1", "y1", "x2", "y2", "x3", "y3"]),
    op!("v", Path, "Append a Bezier curve, first control point on the current point", ["x2", "y2", "x3", "y3"]),
    op!("y", Path, "Append a Bezier curve, second control point on the end point", ["x1", "y1", "x3", "y3"]),
    op!("h", Path, "Close the current subpath", []),
    op!("re", Path, "Append a rectangle", ["x", "y", "width", "height"]),
    op!("W", Path, "Clip using the nonzero winding number rule", []),
    op!("W*", Path, "Clip using the even-odd rule", []),
    // Path painting
    op!("S", Paint, "Stroke the path", []),
    op!("s", Paint, "Close and stroke the path", []),
    op!("f", Paint, "Fill the path using the nonzero winding number rule", []),
    op!("F", Paint, "Fill the path using the nonzero winding number rule", [], "Obsolete synonym of f"),
    op!("f*", Paint, "Fill the path using the even-odd rule", []),
    op!("B", Paint, "Fill and stroke the path, nonzero winding number rule", []),
    op!("B*", Paint, "Fill and stroke the path, even-odd rule", []),
    op!("b", Paint, "Close, fill and stroke the path, nonzero winding number rule", []),
    op!("b*", Paint, "Close, fill and stroke the path, even-odd rule", []),
    op!("n", Paint, "End the path without filling or stroking", [], "Usually follows a clipping operator"),
    op!("sh", Paint, "Paint a shading", ["name"]),
    // Color
    op!("CS", Color, "Set the stroking color space", ["name"]),
    op!("cs", Color, "Set the nonstroking color space", ["name"]),
    op!("SC", Color, "Set the stroking color", ["c1", "..."]),
    op!("SCN", Color, "Set the stroking color, with pattern support", ["c1", "...", "name"]),
    op!("sc", Color, "Set the nonstroking color", ["c1", "..."]),
    op!("scn", Color, "Set the nonstroking color, with pattern support", ["c1", "...", "name"]),
    op!("G", Color, "Set the stroking gray level", ["gray"]),
    op!("g", Color, "Set the nonstroking gray level", ["gray"]),
    op!("RG", Color, "Set the stroking RGB color", ["r", "g", "b"]),
    op!("rg", Color, "Set the nonstroking RGB color", ["r", "g", "b"]),
    op!("K", Color, "Set the stroking CMYK color", ["c", "m", "y", "k"]),
    op!("k", Color, "Set the nonstroking CMYK color", ["c", "m", "y", "k"]),
    // Graphics state
    op!("q", State, "Save the graphics state", [], "Opens a scope closed by Q"),
    op!("Q", State, "Restore the graphics state", []),
    op!("cm", State, "Concatenate a matrix to the current transformation matrix", ["a", "b", "c", "d", "e", "f"]),
    op!("w", State, "Set the line width", ["lineWidth"]),
    op!("J", State, "Set the line cap style", ["lineCap"]),
    op!("j", State, "Set the line join style", ["lineJoin"]),
    op!("M", State, "Set the miter limit", ["miterLimit"]),
    op!("d", State, "Set the line dash pattern", ["dashArray", "dashPhase"]),
    op!("ri", State, "Set the color rendering intent", ["intent"]),
    op!("i", State, "Set the flatness tolerance", ["flatness"]),
    op!("gs", State, "Apply an ExtGState resource", ["dictName"]),
    op!("d0", State, "Set glyph width in a Type 3 font", ["wx", "wy"]),
    op!("d1", State, "Set glyph width and bounding box in a Type 3 font", ["wx", "wy", "llx", "lly", "urx", "ury"]),
    op!("BX", State, "Begin a compatibility section", [], "Unknown operators are ignored until EX"),
    op!("EX", State, "End a compatibility section", []),
    // Text objects and state
    op!("BT", Text, "Begin a text object", [], "Opens a scope closed by ET"),
    op!("ET", Text, "End a text object", []),
    op!("Tc", Text, "Set character spacing", ["charSpace"]),
    op!("Tw", Text, "Set word spacing", ["wordSpace"]),
    op!("Tz", Text, "Set horizontal scaling", ["scale"]),
    op!("TL", Text, "Set text leading", ["leading"]),
    op!("Tf", Text, "Set text font and size", ["font", "size"]),
    op!("Tr", Text, "Set text rendering mode", ["render"]),
    op!("Ts", Text, "Set text rise", ["rise"]),
    op!("Td", Text, "Move to the start of the next line", ["tx", "ty"]),
    op!("TD", Text, "Move to the next line and set the leading", ["tx", "ty"]),
    op!("Tm", Text, "Set the text matrix", ["a", "b", "c", "d", "e", "f"]),
    op!("T*", Text, "Move to the start of the next line using the leading", []),
    // Text showing
    op!("Tj", ShowText, "Show a text string", ["string"]),
    op!("TJ", ShowText, "Show text with individual glyph positioning", ["array"]),
    op!("'", ShowText, "Move to the next line and show a text string", ["string"]),
    op!("\"", ShowText, "Set spacing, move to the next line and show a text string", ["aw", "ac", "string"]),
    // XObjects and inline images
    op!("Do", Image, "Paint an XObject", ["name"]),
    op!("BI", Image, "Begin an inline image", []),
    op!("ID", Image, "Inline image data", [], "Raw bytes up to the matching EI"),
    op!("EI", Image, "End an inline image", []),
    // Marked content
    op!("MP", MarkedContent, "Designate a marked-content point", ["tag"]),
    op!("DP", MarkedContent, "Designate a marked-content point with a property list", ["tag", "properties"]),
    op!("BMC", MarkedContent, "Begin a marked-content sequence", ["tag"], "Opens a scope closed by EMC"),
    op!("BDC", MarkedContent, "Begin a marked-content sequence with a property list", ["tag", "properties"], "Opens a scope closed by EMC"),
    op!("EMC", MarkedContent, "End a marked-content sequence", []),
];

/// Documentation for a standard operator, `None` for anything else.
pub fn lookup_operator_doc(opcode: &str) -> Option<&'static OperatorDoc> {
    OPERATORS.iter().find(|doc| doc.opcode == opcode)
}

/// All documented operators in table order.
pub fn operator_docs() -> &'static [OperatorDoc] {
    OPERATORS
}
