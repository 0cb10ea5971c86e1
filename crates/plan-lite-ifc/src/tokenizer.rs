// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP instance tokenizer using nom combinators
//!
//! Decodes a single `#id=TYPE(attr, ...);` instance into a [`StepEntity`].

use crate::types::{AttributeValue, StepEntity, StepType};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult, Parser,
};
use plan_lite_model::EntityId;

/// Borrowed token, converted to an owned [`AttributeValue`] afterwards
#[derive(Clone, Debug, PartialEq)]
pub enum Token<'a> {
    EntityRef(u32),
    /// Raw string body, still escaped
    String(&'a str),
    Integer(i64),
    Float(f64),
    Enum(&'a str),
    List(Vec<Token<'a>>),
    TypedValue(&'a str, Vec<Token<'a>>),
    Null,
    Derived,
}

impl<'a> Token<'a> {
    pub fn to_attribute_value(&self) -> AttributeValue {
        match self {
            Token::EntityRef(id) => AttributeValue::EntityRef(EntityId(*id)),
            Token::String(s) => AttributeValue::String(decode_string(s)),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(s) => AttributeValue::Enum((*s).to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Token::to_attribute_value).collect())
            }
            Token::TypedValue(name, args) => AttributeValue::TypedValue(
                name.to_ascii_uppercase(),
                args.iter().map(Token::to_attribute_value).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }
}

/// Unescape a STEP string body
///
/// Handles doubled quotes, `\X2\...\X0\` UTF-16 runs and `\X\hh` bytes.
/// Unknown escapes are kept verbatim.
pub fn decode_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(['\'', '\\']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("''") {
            out.push('\'');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\X2\\") {
            match tail.find("\\X0\\") {
                Some(end) => {
                    let units: Vec<u16> = tail[..end]
                        .as_bytes()
                        .chunks(4)
                        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
                        .filter_map(|hex| u16::from_str_radix(hex, 16).ok())
                        .collect();
                    out.push_str(&String::from_utf16_lossy(&units));
                    rest = &tail[end + 4..];
                }
                None => {
                    out.push_str("\\X2\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = tail;
                }
            }
        } else {
            // Lone quote or backslash
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }

    out.push_str(rest);
    out
}

// ============================================================================
// Parsing Primitives
// ============================================================================

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

fn is_keyword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `#123`
fn entity_ref(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('#')(input)?;
    let (input, digits) = take_while1(|c: char| c.is_ascii_digit())(input)?;
    match digits.parse::<u32>() {
        Ok(id) => Ok((input, Token::EntityRef(id))),
        Err(_) => Err(nom::Err::Error(Error::new(digits, ErrorKind::Digit))),
    }
}

/// `'text'`, with `''` as an embedded quote
fn step_string(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('\'')(input)?;
    let bytes = input.as_bytes();

    let mut end = 0;
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if bytes.get(end + 1) == Some(&b'\'') {
                end += 2;
                continue;
            }
            return Ok((&input[end + 1..], Token::String(&input[..end])));
        }
        end += 1;
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

/// Integer or real, with optional exponent
fn number(input: &str) -> IResult<&str, Token<'_>> {
    let (input, text) = recognize((
        opt(alt((char('-'), char('+')))),
        take_while1(|c: char| c.is_ascii_digit()),
        opt(pair(char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((
            alt((char('e'), char('E'))),
            opt(alt((char('+'), char('-')))),
            take_while1(|c: char| c.is_ascii_digit()),
        )),
    ))
    .parse(input)?;

    let is_real = text.contains(['.', 'e', 'E']);
    let token = if is_real {
        // lexical-core rejects a trailing dot ("1."), which STEP allows
        let trimmed = text.strip_suffix('.').unwrap_or(text);
        Token::Float(lexical_core::parse(trimmed.as_bytes()).unwrap_or(0.0))
    } else {
        Token::Integer(lexical_core::parse(text.as_bytes()).unwrap_or(0))
    };
    Ok((input, token))
}

/// `.VALUE.`
fn enumeration(input: &str) -> IResult<&str, Token<'_>> {
    let (input, name) = delimited(char('.'), take_while1(is_keyword_char), char('.')).parse(input)?;
    Ok((input, Token::Enum(name)))
}

fn null_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('$')(input)?;
    Ok((input, Token::Null))
}

fn derived_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, _) = char('*')(input)?;
    Ok((input, Token::Derived))
}

/// `(a, b, ...)`
fn token_list(input: &str) -> IResult<&str, Vec<Token<'_>>> {
    delimited(
        pair(char('('), ws),
        separated_list0((ws, char(','), ws), token),
        pair(ws, char(')')),
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Token<'_>> {
    let (input, items) = token_list(input)?;
    Ok((input, Token::List(items)))
}

/// `IFCLABEL('text')`
fn typed_value(input: &str) -> IResult<&str, Token<'_>> {
    let (input, type_name) = take_while1(is_keyword_char)(input)?;
    let (input, _) = ws(input)?;
    let (input, args) = token_list(input)?;
    Ok((input, Token::TypedValue(type_name, args)))
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        entity_ref,
        step_string,
        null_value,
        derived_value,
        enumeration,
        number,
        list,
        typed_value,
    ))
    .parse(input)
}

// ============================================================================
// Instance Parsing
// ============================================================================

/// Parse one instance, e.g. `#12=IFCSPACE('0x',$,'Office',...);`
pub fn parse_entity(input: &str) -> Result<StepEntity, String> {
    let input = input.trim_start();

    let (input, _) = char::<&str, Error<&str>>('#')(input)
        .map_err(|_| "Expected # at start of instance".to_string())?;

    let (input, digits) = take_while1::<_, &str, Error<&str>>(|c: char| c.is_ascii_digit())(input)
        .map_err(|_| "Expected instance id".to_string())?;
    let id: u32 = digits
        .parse()
        .map_err(|_| format!("Instance id '{}' out of range", digits))?;

    let (input, _) = (ws, char('='), ws)
        .parse(input)
        .map_err(|_: nom::Err<Error<&str>>| format!("Expected = after #{}", id))?;

    let (input, type_name) = take_while1::<_, &str, Error<&str>>(is_keyword_char)(input)
        .map_err(|_| format!("Expected type keyword for #{}", id))?;

    let (input, _) = ws(input).unwrap_or((input, ()));
    let (_, tokens) =
        token_list(input).map_err(|e| format!("Bad attribute list for #{}: {:?}", id, e))?;

    Ok(StepEntity {
        id: EntityId(id),
        step_type: StepType::parse(type_name),
        attributes: tokens.iter().map(Token::to_attribute_value).collect(),
    })
}

/// Parse a parenthesised argument list, e.g. the body of `FILE_NAME(...)`
pub fn parse_arguments(input: &str) -> Option<Vec<AttributeValue>> {
    let (_, tokens) = token_list(input.trim_start()).ok()?;
    Some(tokens.iter().map(Token::to_attribute_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref() {
        let (rest, token) = entity_ref("#123,").unwrap();
        assert_eq!(rest, ",");
        assert_eq!(token, Token::EntityRef(123));
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let (rest, token) = step_string("'it''s',").unwrap();
        assert_eq!(rest, ",");
        assert_eq!(token, Token::String("it''s"));
        assert_eq!(token.to_attribute_value(), AttributeValue::String("it's".into()));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(step_string("'open").is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number("42").unwrap().1, Token::Integer(42));
        assert_eq!(number("-7").unwrap().1, Token::Integer(-7));
        match number("1.5E-3").unwrap().1 {
            Token::Float(f) => assert!((f - 0.0015).abs() < 1e-12),
            other => panic!("expected float, got {:?}", other),
        }
        match number("3.").unwrap().1 {
            Token::Float(f) => assert!((f - 3.0).abs() < 1e-12),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_enum_and_list() {
        assert_eq!(enumeration(".ELEMENT.").unwrap().1, Token::Enum("ELEMENT"));
        match list("( #1 , #2,#3 )").unwrap().1 {
            Token::List(items) => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unicode_escapes() {
        assert_eq!(decode_string("Caf\\X2\\00E9\\X0\\"), "Café");
        assert_eq!(decode_string("\\X\\C4rger"), "Ärger");
        assert_eq!(decode_string("a\\b"), "a\\b");
    }

    #[test]
    fn test_parse_storey() {
        let entity = parse_entity(
            "#40= IFCBUILDINGSTOREY('2Xy',#5,'Level 1',$,$,#41,$,$,.ELEMENT.,3200.);",
        )
        .unwrap();
        assert_eq!(entity.id, EntityId(40));
        assert_eq!(entity.step_type, StepType::BuildingStorey);
        assert_eq!(entity.get_string(2), Some("Level 1"));
        assert_eq!(entity.get_float(9), Some(3200.0));
        assert_eq!(entity.get_enum(8), Some("ELEMENT"));
    }

    #[test]
    fn test_parse_typed_value() {
        let entity = parse_entity("#9=IFCQUANTITYAREA('NetFloorArea',$,$,IFCAREAMEASURE(12.5),$);")
            .unwrap();
        assert_eq!(entity.get_float(3), Some(12.5));
    }

    #[test]
    fn test_parse_entity_errors() {
        assert!(parse_entity("IFCWALL();").is_err());
        assert!(parse_entity("#1 IFCWALL();").is_err());
        assert!(parse_entity("#1=IFCWALL('x',").is_err());
    }
}
