//! XML rendering.
//!
//! Commands use a `<Request>` root and messages a `<Message>` root. Child
//! elements are always `PascalCase`.
//!
//! Decoding reads events directly instead of going through serde: element
//! text is kept byte-for-byte, including leading and trailing whitespace, and
//! the root element name is checked.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::{AppError, Result};

const COMMAND_ROOT: &str = "Request";
const MESSAGE_ROOT: &str = "Message";

const COMMAND_FIELDS: [&str; 3] = ["Command", "Topic", "Content"];
const MESSAGE_FIELDS: [&str; 2] = ["Topic", "Content"];

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommandOut<'a> {
    command: &'a str,
    topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MessageOut<'a> {
    topic: &'a str,
    content: &'a str,
}

pub(super) fn encode_command(kind: &str, topic: &str, content: Option<&str>) -> Result<String> {
    let element = CommandOut {
        command: kind,
        topic,
        content,
    };
    quick_xml::se::to_string_with_root(COMMAND_ROOT, &element)
        .map_err(|e| AppError::Decode(format!("failed to serialise xml command: {e}")))
}

pub(super) fn decode_command(raw: &str) -> Result<(String, String, Option<String>)> {
    let [command, topic, content] = parse_flat(raw, COMMAND_ROOT, COMMAND_FIELDS, "command")?;
    let command = command.ok_or_else(|| missing("command", "Command"))?;
    let topic = topic.ok_or_else(|| missing("command", "Topic"))?;
    Ok((command, topic, content))
}

pub(super) fn encode_message(topic: &str, content: &str) -> Result<String> {
    quick_xml::se::to_string_with_root(MESSAGE_ROOT, &MessageOut { topic, content })
        .map_err(|e| AppError::Decode(format!("failed to serialise xml message: {e}")))
}

pub(super) fn decode_message(raw: &str) -> Result<(String, String)> {
    let [topic, content] = parse_flat(raw, MESSAGE_ROOT, MESSAGE_FIELDS, "message")?;
    let topic = topic.ok_or_else(|| missing("message", "Topic"))?;
    let content = content.ok_or_else(|| missing("message", "Content"))?;
    Ok((topic, content))
}

#[derive(Clone, Copy)]
enum Position {
    Prolog,
    Root,
    Field(usize),
    Epilog,
}

/// Parse `<root><Field>text</Field>...</root>` into one slot per entry of
/// `fields`, in the same order.
///
/// Whitespace-only text is allowed between elements. Unknown, repeated, or
/// nested children are rejected, as is any root other than `root`.
fn parse_flat<const N: usize>(
    raw: &str,
    root: &str,
    fields: [&str; N],
    what: &str,
) -> Result<[Option<String>; N]> {
    let malformed = |detail: String| AppError::Decode(format!("malformed xml {what}: {detail}"));

    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(false);

    let mut values: [Option<String>; N] = std::array::from_fn(|_| None);
    let mut position = Position::Prolog;

    loop {
        match reader.read_event().map_err(|e| malformed(e.to_string()))? {
            Event::Eof => break,
            Event::Start(start) => {
                let name = element_name(&start).map_err(&malformed)?;
                position = match position {
                    Position::Prolog if name == root => Position::Root,
                    Position::Root => {
                        let index = open_field(&mut values, &fields, &name).map_err(&malformed)?;
                        Position::Field(index)
                    }
                    other => return Err(malformed(unexpected_element(other, root, &name))),
                };
            }
            Event::Empty(start) => {
                let name = element_name(&start).map_err(&malformed)?;
                position = match position {
                    Position::Prolog if name == root => Position::Epilog,
                    Position::Root => {
                        open_field(&mut values, &fields, &name).map_err(&malformed)?;
                        Position::Root
                    }
                    other => return Err(malformed(unexpected_element(other, root, &name))),
                };
            }
            Event::End(_) => {
                position = match position {
                    Position::Field(_) => Position::Root,
                    Position::Root => Position::Epilog,
                    Position::Prolog | Position::Epilog => {
                        return Err(malformed("unexpected closing tag".into()));
                    }
                };
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                push_text(&mut values, position, &text).map_err(&malformed)?;
            }
            Event::CData(cdata) => {
                let text = std::str::from_utf8(&cdata).map_err(|e| malformed(e.to_string()))?;
                push_text(&mut values, position, text).map_err(&malformed)?;
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if matches!(position, Position::Epilog) {
        Ok(values)
    } else {
        Err(malformed("unexpected end of document".into()))
    }
}

fn element_name(start: &BytesStart<'_>) -> std::result::Result<String, String> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_owned)
        .map_err(|e| e.to_string())
}

fn open_field<const N: usize>(
    values: &mut [Option<String>; N],
    fields: &[&str; N],
    name: &str,
) -> std::result::Result<usize, String> {
    let index = fields
        .iter()
        .position(|field| *field == name)
        .ok_or_else(|| format!("unknown element <{name}>"))?;
    if values[index].is_some() {
        return Err(format!("duplicate element <{name}>"));
    }
    values[index] = Some(String::new());
    Ok(index)
}

fn push_text<const N: usize>(
    values: &mut [Option<String>; N],
    position: Position,
    text: &str,
) -> std::result::Result<(), String> {
    match position {
        Position::Field(index) => {
            if let Some(value) = values[index].as_mut() {
                value.push_str(text);
            }
            Ok(())
        }
        _ if text.trim().is_empty() => Ok(()),
        _ => Err(format!("unexpected text '{}'", text.trim())),
    }
}

fn unexpected_element(position: Position, root: &str, name: &str) -> String {
    match position {
        Position::Prolog => format!("expected <{root}> root, found <{name}>"),
        Position::Field(_) => format!("unexpected nested element <{name}>"),
        Position::Root | Position::Epilog => format!("unexpected element <{name}> after root"),
    }
}

fn missing(what: &str, field: &str) -> AppError {
    AppError::Decode(format!("malformed xml {what}: missing <{field}>"))
}
