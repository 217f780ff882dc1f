use std::str::{self, FromStr};

use indexmap::IndexMap;
use log::warn;
use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_while, take_while1};
use nom::character::complete::{digit0, digit1, one_of};
use nom::combinator::{all_consuming, map, map_opt, opt, recognize, verify};
use nom::error::ErrorKind;
use nom::multi::{fold_many0, many0};
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::{AsChar, IResult, Input, Parser};
use nom_locate::LocatedSpan;

use crate::content::Operand;
use crate::{Error, Result};

pub(crate) type ParserInput<'a> = LocatedSpan<&'a [u8], &'a str>;
pub(crate) type NomError<'a> = nom::error::Error<ParserInput<'a>>;
pub(crate) type NomResult<'a, O, E = NomError<'a>> = IResult<ParserInput<'a>, O, E>;

/// Maximum nesting of arrays and dictionaries inside one operand.
pub const MAX_NESTING: usize = 64;

#[inline]
fn fail<O>(input: ParserInput, kind: ErrorKind) -> NomResult<O> {
    Err(nom::Err::Error(NomError::new(input, kind)))
}

pub(crate) fn eol(input: ParserInput) -> NomResult<ParserInput> {
    alt((tag(&b"\r\n"[..]), tag(&b"\n"[..]), tag(&b"\r"[..]))).parse(input)
}

pub(crate) fn comment(input: ParserInput) -> NomResult<()> {
    map(
        (tag(&b"%"[..]), take_while(|c: u8| !b"\r\n".contains(&c)), opt(eol)),
        |_| (),
    )
    .parse(input)
}

#[inline]
pub(crate) fn is_whitespace(c: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&c)
}

#[inline]
pub(crate) fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

#[inline]
pub(crate) fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

/// Whitespace and comments.
pub(crate) fn space(input: ParserInput) -> NomResult<()> {
    fold_many0(
        alt((map(take_while1(is_whitespace), |_| ()), comment)),
        || {},
        |_, _| (),
    )
    .parse(input)
}

fn number(input: ParserInput) -> NomResult<f64> {
    let (i, digits) = recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(tag(&b"."[..]), digit0)))),
            recognize(pair(tag(&b"."[..]), digit1)),
        )),
    ))
    .parse(input)?;

    match str::from_utf8(&digits).ok().and_then(|s| f64::from_str(s).ok()) {
        Some(value) => Ok((i, value)),
        None => fail(input, ErrorKind::Float),
    }
}

/// Classify a bare word as a number, boolean or null. Anything else is a keyword.
pub(crate) fn literal_word(word: &[u8]) -> Option<Operand> {
    match word {
        b"true" => Some(Operand::Bool(true)),
        b"false" => Some(Operand::Bool(false)),
        b"null" => Some(Operand::Null),
        _ => all_consuming(number)
            .parse(ParserInput::new_extra(word, "number"))
            .ok()
            .map(|(_, value)| Operand::Number(value)),
    }
}

pub(crate) fn bare_word(input: ParserInput) -> NomResult<ParserInput> {
    take_while1(is_regular).parse(input)
}

fn hex_char(input: ParserInput) -> NomResult<u8> {
    map_opt(
        verify(take(2usize), |h: &ParserInput| h.iter().copied().all(AsChar::is_hex_digit)),
        |h: ParserInput| str::from_utf8(&h).ok().and_then(|s| u8::from_str_radix(s, 16).ok()),
    )
    .parse(input)
}

/// `/Name`, with `#XX` escapes decoded. A `#` not followed by two hex digits is kept as is.
pub(crate) fn name(input: ParserInput) -> NomResult<Vec<u8>> {
    preceded(
        tag(&b"/"[..]),
        many0(alt((
            preceded(tag(&b"#"[..]), hex_char),
            map_opt(take(1usize), |c: ParserInput| is_regular(c[0]).then_some(c[0])),
        ))),
    )
    .parse(input)
}

/// `(...)` with balanced parentheses. Escapes are passed through undecoded, so the result
/// writes back byte for byte.
pub(crate) fn literal_string(input: ParserInput) -> NomResult<Vec<u8>> {
    let (input, _) = tag(&b"("[..]).parse(input)?;
    let bytes: &[u8] = input.fragment();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' if depth == 0 => return Ok((input.take_from(i + 1), bytes[..i].to_vec())),
            b')' => depth -= 1,
            _ => (),
        }
        i += 1;
    }
    fail(input, ErrorKind::Eof)
}

#[inline]
fn hex_digit(input: ParserInput) -> NomResult<u8> {
    map_opt(take(1usize), |c: ParserInput| (c[0] as char).to_digit(16).map(|d| d as u8)).parse(input)
}

/// `<...>`; whitespace is ignored and an odd final digit is padded with a zero nibble.
pub(crate) fn hexadecimal_string(input: ParserInput) -> NomResult<Vec<u8>> {
    map(
        delimited(
            tag(&b"<"[..]),
            terminated(
                fold_many0(
                    preceded(take_while(is_whitespace), hex_digit),
                    || (Vec::new(), false),
                    |(mut out, half): (Vec<u8>, bool), c: u8| {
                        if !half {
                            out.push(c << 4);
                        } else if let Some(last) = out.last_mut() {
                            *last |= c;
                        }
                        (out, !half)
                    },
                ),
                take_while(is_whitespace),
            ),
            tag(&b">"[..]),
        ),
        |(bytes, _)| bytes,
    )
    .parse(input)
}

fn array(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<Operand>> {
    move |input| {
        if depth == 0 {
            return fail(input, ErrorKind::TooLarge);
        }
        delimited(
            pair(tag(&b"["[..]), space),
            many0(terminated(operand(depth - 1), space)),
            tag(&b"]"[..]),
        )
        .parse(input)
    }
}

fn dictionary(depth: usize) -> impl Fn(ParserInput) -> NomResult<IndexMap<Vec<u8>, Operand>> {
    move |input| {
        if depth == 0 {
            return fail(input, ErrorKind::TooLarge);
        }
        delimited(
            pair(tag(&b"<<"[..]), space),
            fold_many0(
                pair(terminated(name, space), terminated(operand(depth - 1), space)),
                IndexMap::new,
                |mut dict, (key, value)| {
                    dict.insert(key, value);
                    dict
                },
            ),
            tag(&b">>"[..]),
        )
        .parse(input)
    }
}

/// Operands that start with a delimiter.
fn delimited_operand(depth: usize) -> impl Fn(ParserInput) -> NomResult<Operand> {
    move |input| {
        alt((
            map(dictionary(depth), Operand::Dict),
            map(hexadecimal_string, Operand::Hex),
            map(literal_string, Operand::String),
            map(name, Operand::Name),
            map(array(depth), Operand::Array),
        ))
        .parse(input)
    }
}

/// Operand nested in an array or dictionary, where bare words are never operators.
fn operand(depth: usize) -> impl Fn(ParserInput) -> NomResult<Operand> {
    move |input| {
        alt((
            delimited_operand(depth),
            map(bare_word, |word: ParserInput| {
                literal_word(&word).unwrap_or_else(|| Operand::String(word.to_vec()))
            }),
        ))
        .parse(input)
    }
}

/// One lexical unit at the top level of a content stream.
#[derive(Debug, PartialEq)]
pub(crate) enum Token {
    Operand(Operand),
    /// Bare word that is not a number or literal; may turn out to be an operator.
    Keyword(Vec<u8>),
}

fn token(input: ParserInput) -> NomResult<Token> {
    alt((
        map(bare_word, |word: ParserInput| match literal_word(&word) {
            Some(operand) => Token::Operand(operand),
            None => Token::Keyword(word.to_vec()),
        }),
        map(delimited_operand(MAX_NESTING), Token::Operand),
    ))
    .parse(input)
}

/// Skip whitespace and comments, then lex one token. `None` at end of input.
pub(crate) fn next_token(input: ParserInput) -> NomResult<Option<Token>> {
    let (input, _) = space(input)?;
    if input.is_empty() {
        return Ok((input, None));
    }
    map(token, Some).parse(input)
}

/// Dictionary and payload of an inline image.
#[derive(Debug, PartialEq)]
pub(crate) struct InlineImage {
    pub dict: IndexMap<Vec<u8>, Operand>,
    pub data: Vec<u8>,
}

enum InlineKey {
    Key(Vec<u8>),
    Data,
    Malformed(Operand),
}

fn inline_key(input: ParserInput) -> NomResult<InlineKey> {
    alt((
        map(name, InlineKey::Key),
        map(bare_word, |word: ParserInput| match &word[..] {
            b"ID" => InlineKey::Data,
            _ => InlineKey::Key(word.to_vec()),
        }),
        map(delimited_operand(MAX_NESTING), InlineKey::Malformed),
    ))
    .parse(input)
}

fn inline_value(input: ParserInput) -> NomResult<Option<Operand>> {
    alt((
        map(verify(bare_word, |word: &ParserInput| &word[..] == b"ID"), |_| None),
        map(operand(MAX_NESTING), Some),
    ))
    .parse(input)
}

fn invalid_inline_image(message: &str) -> Error {
    Error::InvalidInlineImage(message.to_string())
}

/// Position of the first `EI` bounded on both sides by whitespace, a delimiter or the data edges.
fn find_end_marker(data: &[u8]) -> Option<usize> {
    let boundary = |c: u8| is_whitespace(c) || is_delimiter(c);
    data.windows(2).enumerate().find_map(|(i, window)| {
        let bounded = window == b"EI"
            && (i == 0 || boundary(data[i - 1]))
            && data.get(i + 2).is_none_or(|&c| boundary(c));
        bounded.then_some(i)
    })
}

/// Parse the rest of an inline image once `BI` has been consumed: key/value pairs up to
/// `ID`, one whitespace byte, then raw data up to a bounded `EI`.
pub(crate) fn inline_image(input: ParserInput) -> Result<(ParserInput, InlineImage)> {
    let mut dict = IndexMap::new();
    let mut input = input;
    loop {
        let (rest, _) = space(input).map_err(|_| invalid_inline_image("unreadable dictionary"))?;
        if rest.is_empty() {
            return Err(invalid_inline_image("missing ID"));
        }
        let (rest, key) = inline_key(rest).map_err(|_| invalid_inline_image("unreadable dictionary"))?;
        let key = match key {
            InlineKey::Data => {
                input = rest;
                break;
            }
            InlineKey::Key(key) => key,
            InlineKey::Malformed(operand) => {
                warn!("inline image dictionary has non-key entry {:?}, skipping", operand);
                input = rest;
                continue;
            }
        };

        let (rest, _) = space(rest).map_err(|_| invalid_inline_image("unreadable dictionary"))?;
        match inline_value(rest) {
            Ok((rest, Some(value))) => {
                dict.insert(key, value);
                input = rest;
            }
            Ok((rest, None)) => {
                warn!("inline image key {:?} has no value", String::from_utf8_lossy(&key));
                input = rest;
                break;
            }
            Err(_) => return Err(invalid_inline_image("missing ID")),
        }
    }

    let bytes: &[u8] = input.fragment();
    if !bytes.first().is_some_and(|&c| is_whitespace(c)) {
        return Err(invalid_inline_image("ID must be followed by a whitespace byte"));
    }
    let data = &bytes[1..];
    let end = find_end_marker(data).ok_or_else(|| invalid_inline_image("missing EI"))?;
    let payload_end = if end > 0 && is_whitespace(data[end - 1]) { end - 1 } else { end };

    Ok((
        input.take_from(1 + end + 2),
        InlineImage {
            dict,
            data: data[..payload_end].to_vec(),
        },
    ))
}

fn unsigned_int<I: FromStr>(input: ParserInput) -> NomResult<I> {
    map_opt(digit1, |digits: ParserInput| {
        str::from_utf8(&digits).ok().and_then(|s| I::from_str(s).ok())
    })
    .parse(input)
}

/// `(object number, offset)` pairs from the head of an object stream.
pub(crate) fn object_stream_header(data: &[u8]) -> Vec<(u32, usize)> {
    let input = ParserInput::new_extra(data, "object stream header");
    many0(pair(
        preceded(space, unsigned_int::<u32>),
        preceded(space, unsigned_int::<usize>),
    ))
    .parse(input)
    .map(|(_, pairs)| pairs)
    .unwrap_or_default()
}
