use crate::error::DecompressError;
use crate::{Error, Result};
use indexmap::IndexMap;
use log::warn;
use std::fmt;
use std::io;

/// Object identifier consists of two parts: object number and generation number.
pub type ObjectId = (u32, u16);

/// Canonical map key for a reference: `12R` for generation 0, `12R3` otherwise.
pub fn reference_key(id: ObjectId) -> String {
    if id.1 == 0 {
        format!("{}R", id.0)
    } else {
        format!("{}R{}", id.0, id.1)
    }
}

/// Parse a key produced by [`reference_key`] back into an object id.
pub fn parse_reference_key(key: &str) -> Result<ObjectId> {
    let invalid = || Error::ReferenceKey(key.to_string());
    let (number, generation) = key.split_once('R').ok_or_else(invalid)?;
    if number.is_empty() || (number.len() > 1 && number.starts_with('0')) || !number.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }
    let number = number.parse().map_err(|_| invalid())?;
    let generation = match generation {
        "" => 0,
        // "12R0" would collide with "12R".
        g if g.starts_with('0') || !g.bytes().all(|b| b.is_ascii_digit()) => return Err(invalid()),
        g => g.parse().map_err(|_| invalid())?,
    };
    Ok((number, generation))
}

/// Dictionary object.
#[derive(Clone, Default, PartialEq)]
pub struct Dictionary(IndexMap<Vec<u8>, Object>);

/// Stream object
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    /// Associated stream dictionary
    pub dict: Dictionary,
    /// Contents of the stream in bytes
    pub content: Vec<u8>,
}

/// Basic PDF object types defined in an enum.
#[derive(Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    String(Vec<u8>, StringFormat),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

/// String objects can be written in two formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringFormat {
    #[default]
    Literal,
    Hexadecimal,
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<i64> for Object {
    fn from(number: i64) -> Self {
        Object::Integer(number)
    }
}

macro_rules! from_smaller_ints {
    ($( $Int: ty )+) => {
        $(
            impl From<$Int> for Object {
                fn from(number: $Int) -> Self {
                    Object::Integer(i64::from(number))
                }
            }
        )+
    }
}

from_smaller_ints! {
    i8 i16 i32
    u8 u16 u32
}

impl From<f32> for Object {
    fn from(number: f32) -> Self {
        Object::Real(number)
    }
}

impl<'a> From<&'a str> for Object {
    fn from(name: &'a str) -> Self {
        Object::Name(name.as_bytes().to_vec())
    }
}

impl From<Vec<Object>> for Object {
    fn from(array: Vec<Object>) -> Self {
        Object::Array(array)
    }
}

impl From<Dictionary> for Object {
    fn from(dict: Dictionary) -> Self {
        Object::Dictionary(dict)
    }
}

impl From<Stream> for Object {
    fn from(stream: Stream) -> Self {
        Object::Stream(stream)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

impl Object {
    pub fn string_literal<S: Into<Vec<u8>>>(s: S) -> Self {
        Object::String(s.into(), StringFormat::Literal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn enum_variant(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::Name(_) => "Name",
            Object::String(..) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream(_) => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    fn wrong_type(&self, expected: &'static str) -> Error {
        Error::ObjectType {
            expected,
            found: self.enum_variant(),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match *self {
            Object::Integer(value) => Ok(value),
            _ => Err(self.wrong_type("Integer")),
        }
    }

    pub fn as_name(&self) -> Result<&[u8]> {
        match self {
            Object::Name(name) => Ok(name),
            _ => Err(self.wrong_type("Name")),
        }
    }

    pub fn as_reference(&self) -> Result<ObjectId> {
        match *self {
            Object::Reference(id) => Ok(id),
            _ => Err(self.wrong_type("Reference")),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Object>> {
        match self {
            Object::Array(arr) => Ok(arr),
            _ => Err(self.wrong_type("Array")),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Ok(dict),
            _ => Err(self.wrong_type("Dictionary")),
        }
    }

    pub fn as_stream(&self) -> Result<&Stream> {
        match self {
            Object::Stream(stream) => Ok(stream),
            _ => Err(self.wrong_type("Stream")),
        }
    }

    /// Dictionary of a dictionary or stream object.
    pub fn dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => f.write_str("null"),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Integer(value) => write!(f, "{}", value),
            Object::Real(value) => write!(f, "{}", value),
            Object::Name(name) => write!(f, "/{}", String::from_utf8_lossy(name)),
            Object::String(text, StringFormat::Literal) => write!(f, "({})", String::from_utf8_lossy(text)),
            Object::String(text, StringFormat::Hexadecimal) => {
                f.write_str("<")?;
                for byte in text {
                    write!(f, "{:02X}", byte)?;
                }
                f.write_str(">")
            }
            Object::Array(array) => {
                let items = array.iter().map(|item| format!("{:?}", item)).collect::<Vec<String>>();
                write!(f, "[{}]", items.join(" "))
            }
            Object::Dictionary(dict) => write!(f, "{:?}", dict),
            Object::Stream(stream) => write!(f, "{:?}stream...endstream", stream.dict),
            Object::Reference(id) => write!(f, "{} {} R", id.0, id.1),
        }
    }
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary(IndexMap::new())
    }

    pub fn has(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &[u8]) -> Result<&Object> {
        self.0
            .get(key)
            .ok_or_else(|| Error::DictKey(String::from_utf8_lossy(key).into_owned()))
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Vec<u8>>,
        V: Into<Object>,
    {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    pub fn type_is(&self, type_name: &[u8]) -> bool {
        self.get(b"Type").and_then(Object::as_name).ok() == Some(type_name)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Vec<u8>, Object> {
        self.0.iter()
    }
}

#[macro_export]
macro_rules! dictionary {
    () => {
        $crate::Dictionary::new()
    };
    ($( $key: expr => $value: expr ),+ ,) => {
        $crate::dictionary!( $($key => $value),+ )
    };
    ($( $key: expr => $value: expr ),*) => {{
        let mut dict = $crate::Dictionary::new();
        $(
            dict.set($key, $value);
        )*
        dict
    }}
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .iter()
            .map(|(key, value)| format!("/{} {:?}", String::from_utf8_lossy(key), value))
            .collect::<Vec<String>>();
        write!(f, "<<{}>>", entries.concat())
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Vec<u8>, &'a Object);
    type IntoIter = indexmap::map::Iter<'a, Vec<u8>, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<Vec<u8>>> FromIterator<(K, Object)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, Object)>>(iter: I) -> Self {
        let mut dict = Dictionary::new();
        for (k, v) in iter {
            dict.set(k, v);
        }
        dict
    }
}

impl Stream {
    pub fn new(mut dict: Dictionary, content: Vec<u8>) -> Stream {
        dict.set("Length", content.len() as i64);
        Stream { dict, content }
    }

    pub fn filters(&self) -> Result<Vec<&[u8]>> {
        let filter = match self.dict.get(b"Filter") {
            Ok(filter) => filter,
            Err(_) => return Ok(vec![]),
        };

        if let Ok(name) = filter.as_name() {
            Ok(vec![name])
        } else {
            // It is an error if a single entry is not a name.
            filter.as_array()?.iter().map(Object::as_name).collect()
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.dict.has(b"Filter")
    }

    pub fn set_plain_content(&mut self, content: Vec<u8>) {
        self.dict.remove(b"DecodeParms");
        self.dict.remove(b"Filter");
        self.dict.set("Length", content.len() as i64);
        self.content = content;
    }

    pub fn decompressed_content(&self) -> Result<Vec<u8>> {
        let filters = self.filters()?;
        let params = self.dict.get(b"DecodeParms").ok().and_then(|params| match params {
            Object::Dictionary(dict) => Some(dict),
            // One entry per filter; only the last filter may carry a predictor we support.
            Object::Array(array) => array.last().and_then(|p| p.as_dict().ok()),
            _ => None,
        });

        let mut output = self.content.clone();
        // Filters are in decoding order.
        for filter in filters {
            output = match filter {
                b"FlateDecode" | b"Fl" => Self::decompress_zlib(&output, params)?,
                b"LZWDecode" | b"LZW" => Self::decompress_lzw(&output, params)?,
                other => {
                    return Err(DecompressError::UnsupportedFilter(String::from_utf8_lossy(other).into_owned()).into());
                }
            };
        }
        Ok(output)
    }

    fn decompress_lzw(input: &[u8], params: Option<&Dictionary>) -> Result<Vec<u8>> {
        use weezl::{BitOrder, decode::Decoder};
        const MIN_BITS: u8 = 8;

        let early_change = params
            .and_then(|p| p.get(b"EarlyChange").ok())
            .and_then(|p| p.as_i64().ok())
            .map(|v| v != 0)
            .unwrap_or(true);

        let mut decoder = if early_change {
            Decoder::with_tiff_size_switch(BitOrder::Msb, MIN_BITS)
        } else {
            Decoder::new(BitOrder::Msb, MIN_BITS)
        };
        let output = decoder
            .decode(input)
            .map_err(|err| DecompressError::Lzw(err.to_string()))?;

        Self::decompress_predictor(output, params)
    }

    fn decompress_zlib(input: &[u8], params: Option<&Dictionary>) -> Result<Vec<u8>> {
        use flate2::read::ZlibDecoder;
        use std::io::prelude::*;

        let mut output = Vec::with_capacity(input.len() * 2);
        if !input.is_empty() {
            let mut decoder = ZlibDecoder::new(input);
            if let Err(err) = decoder.read_to_end(&mut output) {
                // Keep whatever was inflated before the corruption.
                if output.is_empty() {
                    return Err(DecompressError::Flate(err).into());
                }
                warn!("truncated zlib stream: {}", err);
            }
        }
        Self::decompress_predictor(output, params)
    }

    fn decompress_predictor(data: Vec<u8>, params: Option<&Dictionary>) -> Result<Vec<u8>> {
        use crate::filters::png;

        let Some(params) = params else {
            return Ok(data);
        };
        let get = |key: &[u8], default: i64| params.get(key).and_then(Object::as_i64).unwrap_or(default);
        let predictor = get(b"Predictor", 1);
        if !(10..=15).contains(&predictor) {
            return Ok(data);
        }

        let positive = |key: &[u8], default: i64| {
            let value = get(key, default);
            usize::try_from(value).ok().filter(|&n| n > 0).ok_or_else(|| {
                let message = format!("{} {} is out of range", String::from_utf8_lossy(key), value);
                DecompressError::Predictor(io::Error::new(io::ErrorKind::InvalidInput, message))
            })
        };
        let pixels_per_row = positive(b"Columns", 1)?;
        let colors = positive(b"Colors", 1)?;
        let bits = positive(b"BitsPerComponent", 8)?;
        let bytes_per_pixel = colors
            .checked_mul(bits)
            .ok_or_else(|| {
                let message = format!("{} colors of {} bits overflow a pixel", colors, bits);
                DecompressError::Predictor(io::Error::new(io::ErrorKind::InvalidInput, message))
            })?
            .div_ceil(8);
        png::decode_frame(&data, bytes_per_pixel, pixels_per_row).map_err(|e| DecompressError::Predictor(e).into())
    }

    /// Replace the content with its decoded form. Leaves the stream untouched if decoding fails.
    pub fn decompress(&mut self) {
        if !self.is_compressed() {
            return;
        }
        match self.decompressed_content() {
            Ok(data) => self.set_plain_content(data),
            Err(err) => warn!("stream left compressed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_keys_are_distinct_per_generation() {
        assert_eq!(reference_key((12, 0)), "12R");
        assert_eq!(reference_key((12, 3)), "12R3");
        assert_ne!(reference_key((1, 23)), reference_key((12, 3)));
    }

    #[test]
    fn reference_keys_parse_back() {
        for id in [(0, 0), (7, 0), (7, 1), (4_000_000, 65535)] {
            assert_eq!(parse_reference_key(&reference_key(id)).unwrap(), id);
        }
        for bad in ["", "R", "12", "12R0", "012R", "12Rx", "x12R", "12 0 R"] {
            assert!(parse_reference_key(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn flate_stream_decompresses_in_place() {
        use flate2::Compression;
        use flate2::write::ZlibEncoder;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"0 0 m 10 10 l S").unwrap();
        let mut stream = Stream::new(dictionary! { "Filter" => "FlateDecode" }, encoder.finish().unwrap());

        stream.decompress();
        assert_eq!(stream.content, b"0 0 m 10 10 l S");
        assert!(!stream.dict.has(b"Filter"));
        assert_eq!(stream.dict.get(b"Length").unwrap().as_i64().unwrap(), 15);
    }

    fn predicted_flate_stream(params: Dictionary) -> Stream {
        use flate2::Compression;
        use flate2::write::ZlibEncoder;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[2, 1, 2, 2, 1, 1]).unwrap();
        Stream::new(
            dictionary! { "Filter" => "FlateDecode", "DecodeParms" => params },
            encoder.finish().unwrap(),
        )
    }

    #[test]
    fn png_predictor_rows_are_undone() {
        let mut stream = predicted_flate_stream(dictionary! { "Predictor" => 12, "Columns" => 2 });
        stream.decompress();
        assert_eq!(stream.content, vec![1, 2, 2, 3]);
    }

    #[test]
    fn oversized_predictor_parameters_leave_stream_compressed() {
        let oversized = [
            dictionary! { "Predictor" => 12, "Colors" => i64::MAX },
            dictionary! { "Predictor" => 12, "Columns" => 1_i64 << 40 },
            dictionary! { "Predictor" => 12, "Colors" => 1_i64 << 40, "BitsPerComponent" => 1_i64 << 40 },
            dictionary! { "Predictor" => 12, "Columns" => -3 },
        ];
        for params in oversized {
            let mut stream = predicted_flate_stream(params);
            assert!(matches!(
                stream.decompressed_content(),
                Err(Error::Decompress(DecompressError::Predictor(_)))
            ));
            let compressed = stream.content.clone();
            stream.decompress();
            assert_eq!(stream.content, compressed);
            assert!(stream.is_compressed());
        }
    }

    #[test]
    fn unsupported_filter_leaves_stream_alone() {
        let mut stream = Stream::new(dictionary! { "Filter" => "DCTDecode" }, vec![0xFF, 0xD8]);
        stream.decompress();
        assert_eq!(stream.content, vec![0xFF, 0xD8]);
        assert!(stream.is_compressed());
    }
}
