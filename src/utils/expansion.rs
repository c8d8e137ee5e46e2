use crate::utils::env::Mapping;

const OPERATOR: u8 = b'$';
const REFERENCE_OPENER: u8 = b'(';
const REFERENCE_CLOSER: u8 = b')';

/// A `$(NAME)` reference with no value in the mapping.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("undefined variable $({0})")]
pub struct Unresolved(pub String);

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Reference(&'a str),
}

/// Splits `input` into literal text and `$(NAME)` references.
///
/// `$$` collapses to a single literal `$`, an unterminated `$(` and a `$` followed by anything
/// else are kept as literal text. The operator and delimiters are ASCII, so byte offsets always
/// land on char boundaries.
fn scan(input: &str) -> Vec<Segment<'_>> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut checkpoint = 0;
    let mut cursor = 0;

    while cursor + 1 < bytes.len() {
        if bytes[cursor] != OPERATOR {
            cursor += 1;
            continue;
        }

        match bytes[cursor + 1] {
            OPERATOR => {
                // keep the first `$`, drop the second
                segments.push(Segment::Literal(&input[checkpoint..cursor + 1]));
                cursor += 2;
                checkpoint = cursor;
            }
            REFERENCE_OPENER => match bytes[cursor + 2..]
                .iter()
                .position(|byte| *byte == REFERENCE_CLOSER)
            {
                Some(length) => {
                    segments.push(Segment::Literal(&input[checkpoint..cursor]));
                    segments.push(Segment::Reference(&input[cursor + 2..cursor + 2 + length]));
                    cursor += length + 3;
                    checkpoint = cursor;
                }
                // unterminated, keep `$(` and go on after it
                None => cursor += 2,
            },
            _ => cursor += 1,
        }
    }

    segments.push(Segment::Literal(&input[checkpoint..]));
    segments.retain(|segment| segment != &Segment::Literal(""));
    segments
}

fn unresolved(name: &str) -> String {
    format!("$({})", name)
}

/// Expands every `$(NAME)` in `command` with its value from `mapping`.
///
/// Names missing from the mapping are left in place as `$(NAME)`. Substituted values are not
/// scanned again.
pub fn expand(command: &str, mapping: &Mapping) -> String {
    let mut expanded = String::with_capacity(command.len());

    for segment in scan(command) {
        match segment {
            Segment::Literal(text) => expanded.push_str(text),
            Segment::Reference(name) => match mapping.get(name) {
                Some(value) => expanded.push_str(value),
                None => expanded.push_str(&unresolved(name)),
            },
        }
    }

    expanded
}

/// Same as [`expand`], but fails with the first name that has no value in `mapping`.
pub fn expand_strict(command: &str, mapping: &Mapping) -> Result<String, Unresolved> {
    if let Some(missing) = references(command)
        .into_iter()
        .find(|name| !mapping.contains_key(*name))
    {
        return Err(Unresolved(missing.to_string()));
    }

    Ok(expand(command, mapping))
}

/// Names referenced by `command`, in order of appearance. Escaped references are not included.
pub fn references(command: &str) -> Vec<&str> {
    scan(command)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Reference(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect()
}
