use pdf_inspect::{
    Content, Error, Operand, Operation, disabled_closure, lookup_operator_doc, parse_content_stream, print_operand,
    serialize_with_disabled_operators,
};

mod utils;
use utils::init_logging;

const STREAMS: &[&[u8]] = &[
    b"q 1 0 0 1 0 0 cm /GS0 gs BT /F1 12 Tf 72 712 Td [(Hello) -250 (World)] TJ ET Q",
    b"/OC /MC0 BDC 0 0 1 rg 0 0 100 100 re f EMC q BI /W 2 /H 2 /CS /G /BPC 8 ID \x00\xff\x10\x20 EI Q",
    b"q 0.5 g 1 2 BI /W 1 /H 1 ID x EI Q 5 6",
    b"BT /F1 1 Tf <48656C6C6F> Tj (a\\)b) ' 1 2 (c) \" ET % comment\n/P <</MCID 0>> BDC EMC",
    b"Q Q q 0 0 m 10 10 l S",
    b"q x\\ Q 1 1 m S",
    b"BT [(ok) foo\\ 3] TJ ET",
];

fn operators(operations: &[Operation]) -> Vec<&str> {
    operations.iter().map(|op| op.operator.as_str()).collect()
}

fn depths(data: &[u8]) -> Vec<usize> {
    parse_content_stream(data).unwrap().iter().map(|op| op.depth).collect()
}

#[test]
fn zero_operand_operators_track_open_scopes() {
    init_logging();
    let operations = parse_content_stream(b"q q Q q q Q Q Q").unwrap();
    assert_eq!(operators(&operations), vec!["q", "q", "Q", "q", "q", "Q", "Q", "Q"]);
    assert!(operations.iter().all(|op| op.operands.is_empty()));
    assert_eq!(depths(b"q q Q q q Q Q Q"), vec![0, 1, 1, 1, 2, 2, 1, 0]);
}

#[test]
fn operands_drain_into_the_next_operator() {
    let operations = parse_content_stream(b"1 2 3 m").unwrap();
    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0].operator, "m");
    assert_eq!(
        operations[0].operands,
        vec![Operand::Number(1.0), Operand::Number(2.0), Operand::Number(3.0)]
    );
}

#[test]
fn unbalanced_closers_never_go_below_zero() {
    assert_eq!(depths(b"Q Q q 0 0 m"), vec![0, 0, 0, 1]);
}

#[test]
fn inline_image_round_trip() {
    let data = b"BI /W 2 /H 2 ID \x00\x01\x02\x03 EI";
    let operations = parse_content_stream(data).unwrap();
    assert_eq!(operators(&operations), vec!["BI", "ID", "EI"]);

    let Operand::Dict(dict) = &operations[0].operands[0] else {
        panic!("BI carries the image dictionary");
    };
    assert_eq!(dict.len(), 2);
    assert_eq!(dict[&b"W"[..]], Operand::Number(2.0));
    assert_eq!(dict[&b"H"[..]], Operand::Number(2.0));
    assert_eq!(operations[1].operands, vec![Operand::Bytes(vec![0, 1, 2, 3])]);
    assert!(operations[2].operands.is_empty());

    assert_eq!(serialize_with_disabled_operators(&operations, &[]), data.to_vec());
}

#[test]
fn broken_inline_images_fail_only_their_parse() {
    assert!(matches!(
        parse_content_stream(b"BI /W 1 ID\x01 EI"),
        Err(Error::InvalidInlineImage(_))
    ));
    assert!(matches!(
        parse_content_stream(b"q BI /W 1 /H 1 ID abc Q"),
        Err(Error::InvalidInlineImage(_))
    ));
    assert!(parse_content_stream(STREAMS[1]).is_ok());
}

#[test]
fn serialization_without_disabled_operators_reparses_identically() {
    for data in STREAMS {
        let operations = parse_content_stream(data).unwrap();
        let encoded = serialize_with_disabled_operators(&operations, &[]);
        assert_eq!(parse_content_stream(&encoded).unwrap(), operations, "{}", String::from_utf8_lossy(data));
    }
}

#[test]
fn disabled_operators_disappear_from_the_reparse() {
    for data in STREAMS {
        let operations = parse_content_stream(data).unwrap();
        let n = operations.len();
        let mut selections: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        for i in 0..n {
            for j in i + 1..n {
                selections.push(vec![i, j]);
            }
        }

        for disabled in selections {
            let closure = disabled_closure(&operations, &disabled);
            assert!(disabled.iter().all(|i| closure.contains(i)));
            let expected: Vec<&str> = operations
                .iter()
                .enumerate()
                .filter(|(i, _)| !closure.contains(i))
                .map(|(_, op)| op.operator.as_str())
                .collect();

            let encoded = serialize_with_disabled_operators(&operations, &disabled);
            let reparsed = parse_content_stream(&encoded).unwrap();
            assert_eq!(
                operators(&reparsed),
                expected,
                "disabling {:?} in {}",
                disabled,
                String::from_utf8_lossy(data)
            );
        }
    }
}

#[test]
fn disabling_a_scope_opener_removes_its_scope() {
    let operations = parse_content_stream(STREAMS[0]).unwrap();
    let encoded = serialize_with_disabled_operators(&operations, &[3]);
    assert_eq!(
        operators(&parse_content_stream(&encoded).unwrap()),
        vec!["q", "cm", "gs", "Q"]
    );
}

#[test]
fn render_lists_one_operator_per_line() {
    let content = Content::decode(STREAMS[1]).unwrap();
    let lines: Vec<String> = content.render().lines().map(String::from).collect();
    assert_eq!(lines[0], "/OC /MC0 BDC");
    assert_eq!(lines[1], "  0 0 1 rg");
    assert_eq!(lines[5], "q");
    assert_eq!(lines[6], "  <</W 2 /H 2 /CS /G /BPC 8>> BI");
    assert_eq!(lines[7], "  <4 bytes> ID");
    assert_eq!(lines[8], "  EI");
    assert_eq!(lines[9], "Q");
}

#[test]
fn printed_operands_use_pdf_syntax() {
    let operations = parse_content_stream(STREAMS[0]).unwrap();
    let printed: Vec<String> = operations[6].operands.iter().map(print_operand).collect();
    assert_eq!(printed, vec!["[(Hello) -250 (World)]"]);
    assert_eq!(operations[6].to_string(), "    [(Hello) -250 (World)] TJ");
}

#[test]
fn parsed_standard_operators_are_documented() {
    for data in STREAMS {
        for op in parse_content_stream(data).unwrap() {
            if !op.is_dangling() {
                let doc = lookup_operator_doc(&op.operator);
                assert!(doc.is_some(), "no documentation for {}", op.operator);
                assert_eq!(doc.unwrap().opcode, op.operator);
            }
        }
    }
}
