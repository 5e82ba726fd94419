//! # Tool Description Formatter
//!
//! Renders one line per tool for the system instructions:
//! `Tool: <name>, Args: [...], Description: <text>, Schema: <json>`.

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::{Map, Value};
use std::io;

use crate::domain::traits::SharedTool;
use crate::domain::types::ToolDescriptor;

pub const NO_DESCRIPTION: &str = "No description";

pub fn describe_tools(tools: &[SharedTool]) -> String {
    tools
        .iter()
        .map(|tool| describe_tool(tool.descriptor()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn describe_tool(descriptor: &ToolDescriptor) -> String {
    let description = descriptor
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(NO_DESCRIPTION);
    let schema = descriptor
        .schema
        .clone()
        .unwrap_or_else(|| Value::Object(Map::new()));

    format!(
        "Tool: {}, Args: {}, Description: {}, Schema: {}",
        descriptor.callable_name(),
        format_arg_names(&descriptor.arg_names()),
        description.lines().map(str::trim).collect::<Vec<_>>().join(" "),
        escape_braces(&to_spaced_json(&schema))
    )
}

/// `['a', 'b']`
fn format_arg_names(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

/// JSON with `", "` and `": "` separators and non-ASCII escaped as `\uXXXX`.
pub fn to_spaced_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, SpacedFormatter);
    if value.serialize(&mut serializer).is_err() {
        return value.to_string();
    }
    String::from_utf8(buf).unwrap_or_else(|_| value.to_string())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
    ) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                let mut utf8 = [0u8; 4];
                writer.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Double every brace so the text survives another template pass.
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}
