#![feature(test)]

extern crate test;
use pdf_inspect::{Content, serialize_with_disabled_operators};

fn page_content(repeat: usize) -> Vec<u8> {
    let mut content = Vec::new();
    for i in 0..repeat {
        content.extend_from_slice(b"q 1 0 0 1 72 720 cm /GS0 gs BT /F1 12 Tf 0 -14 TD ");
        content.extend_from_slice(format!("[(Line {}) -250 (of text)] TJ ET Q\n", i).as_bytes());
        content.extend_from_slice(b"0 0 1 rg 10 10 100 50 re f BI /W 2 /H 2 /BPC 8 /CS /G ID \x01\x02\x03\x04 EI\n");
    }
    content
}

#[bench]
fn bench_decode_content(b: &mut test::test::Bencher) {
    let content = page_content(500);
    b.iter(|| {
        Content::decode(&content).unwrap();
    })
}

#[bench]
fn bench_serialize_with_disabled(b: &mut test::test::Bencher) {
    let operations = Content::decode(&page_content(500)).unwrap().operations;
    let disabled: Vec<usize> = (0..operations.len()).step_by(7).collect();
    b.iter(|| serialize_with_disabled_operators(&operations, &disabled))
}
