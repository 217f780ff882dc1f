use std::ops::Range;

use log::warn;

use crate::error::ParseError;
use crate::parser;
use crate::{Error, Object, Result, Stream};

/// Where each member of an object stream lives inside the decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectStreamLayout {
    /// Length of the header table, the `First` entry of the stream dictionary.
    pub first: usize,
    /// Member object numbers with their byte span, in header order.
    pub members: Vec<(u32, Range<usize>)>,
}

impl ObjectStreamLayout {
    /// Read the header of an already decompressed object stream.
    pub fn new(stream: &Stream) -> Result<ObjectStreamLayout> {
        let first: usize = stream
            .dict
            .get(b"First")
            .and_then(Object::as_i64)?
            .try_into()
            .map_err(|_| ParseError::InvalidObjectStream)?;
        if stream.is_compressed() {
            warn!("object stream payload is still encoded, member ranges may be wrong");
        }

        let layout = ObjectStreamLayout::from_payload(&stream.content, first);
        if let Ok(n) = stream.dict.get(b"N").and_then(Object::as_i64) {
            if usize::try_from(n).ok() != Some(layout.members.len()) {
                warn!("object stream: the object stream dictionary specifies a wrong number of objects");
            }
        }
        Ok(layout)
    }

    /// Member spans reach from their own offset to the next member's offset, the last one
    /// to the end of the payload. Offsets count from `first`.
    pub fn from_payload(payload: &[u8], first: usize) -> ObjectStreamLayout {
        let header = &payload[..first.min(payload.len())];
        let pairs = parser::object_stream_header(header);

        let members = pairs
            .iter()
            .enumerate()
            .map(|(i, &(number, offset))| {
                let start = first.saturating_add(offset).min(payload.len());
                let end = match pairs.get(i + 1) {
                    Some(&(_, next)) => first.saturating_add(next).min(payload.len()),
                    None => payload.len(),
                };
                if end < start {
                    warn!("object stream member {} has a decreasing offset", number);
                }
                (number, start..end.max(start))
            })
            .collect();

        ObjectStreamLayout { first, members }
    }

    pub fn range_of(&self, number: u32) -> Option<Range<usize>> {
        self.members
            .iter()
            .find(|(member, _)| *member == number)
            .map(|(_, range)| range.clone())
    }
}

impl TryFrom<&Object> for ObjectStreamLayout {
    type Error = Error;

    fn try_from(object: &Object) -> Result<ObjectStreamLayout> {
        ObjectStreamLayout::new(object.as_stream()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn payload(header: &str, first: usize, total: usize) -> Vec<u8> {
        let mut data = header.as_bytes().to_vec();
        data.resize(first, b' ');
        data.resize(total, b'x');
        data
    }

    #[test]
    fn member_ranges_follow_header_offsets() {
        let layout = ObjectStreamLayout::from_payload(&payload("7 0 9 15", 20, 50), 20);
        assert_eq!(layout.members, vec![(7, 20..35), (9, 35..50)]);
    }

    #[test]
    fn adjacent_member_offsets() {
        let layout = ObjectStreamLayout::from_payload(&payload("7 0 9 9", 20, 44), 20);
        assert_eq!(layout.range_of(7), Some(20..29));
        assert_eq!(layout.range_of(9), Some(29..44));
        assert_eq!(layout.range_of(8), None);
    }

    #[test]
    fn offsets_past_the_payload_are_clamped() {
        let layout = ObjectStreamLayout::from_payload(&payload("1 0 2 500", 10, 30), 10);
        assert_eq!(layout.members, vec![(1, 10..30), (2, 30..30)]);
    }

    #[test]
    fn layout_from_stream_dictionary() {
        let stream = Stream::new(
            dictionary! { "Type" => "ObjStm", "N" => 2, "First" => 10 },
            payload("3 0 4 5", 10, 20),
        );
        let layout = ObjectStreamLayout::try_from(&Object::Stream(stream)).unwrap();
        assert_eq!(layout.first, 10);
        assert_eq!(layout.members, vec![(3, 10..15), (4, 15..20)]);

        let missing_first = Stream::new(dictionary! { "Type" => "ObjStm" }, vec![]);
        assert!(ObjectStreamLayout::new(&missing_first).is_err());
    }
}
