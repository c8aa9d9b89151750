// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Native syntax serializer.
//!
//! Output follows `terraform fmt` conventions: two-space indentation, `=`
//! aligned across consecutive attributes and a blank line between blocks.

use super::block::{Block, Entry, Value};

const INDENT: &str = "  ";

/// Serializes `blocks` preceded by an optional `#` comment header.
pub fn to_string(header: Option<&str,>, blocks: &[Block],) -> String
{
    let mut out = String::new();

    if let Some(header,) = header {
        for line in header.lines() {
            if line.is_empty() {
                out.push_str("#\n",);
            } else {
                out.push_str("# ",);
                out.push_str(line,);
                out.push('\n',);
            }
        }
        if !blocks.is_empty() {
            out.push('\n',);
        }
    }

    for (index, block,) in blocks.iter().enumerate() {
        if index > 0 {
            out.push('\n',);
        }
        write_block(&mut out, block, 0,);
    }

    out
}

fn write_block(out: &mut String, block: &Block, depth: usize,)
{
    push_indent(out, depth,);
    out.push_str(block.keyword(),);
    for label in block.labels() {
        out.push(' ',);
        out.push_str(&quote(label,),);
    }

    if block.entries().is_empty() {
        out.push_str(" {}\n",);
        return;
    }

    out.push_str(" {\n",);
    write_entries(out, block.entries(), depth + 1,);
    push_indent(out, depth,);
    out.push_str("}\n",);
}

fn write_entries(out: &mut String, entries: &[Entry], depth: usize,)
{
    let mut index = 0;
    let mut previous_attribute = None;

    while index < entries.len() {
        match &entries[index] {
            Entry::Block(block,) => {
                if previous_attribute.is_some() {
                    out.push('\n',);
                }
                write_block(out, block, depth,);
                previous_attribute = Some(false,);
                index += 1;
            }
            Entry::Attribute(..,) => {
                if previous_attribute == Some(false,) {
                    out.push('\n',);
                }
                let run = alignment_group(&entries[index..],);
                let attributes = entries[index..index + run].iter().filter_map(|entry| match entry {
                    Entry::Attribute(name, value,) => Some((name.as_str(), value,),),
                    Entry::Block(_,) => None,
                },);
                write_attributes(out, attributes, depth,);
                previous_attribute = Some(true,);
                index += run;
            }
        }
    }
}

/// Length of the leading attribute run sharing one `=` column. A multi-line
/// value closes its group.
fn alignment_group(entries: &[Entry],) -> usize
{
    let mut run = 0;
    for entry in entries {
        match entry {
            Entry::Attribute(_, value,) => {
                run += 1;
                if value.is_multiline() {
                    break;
                }
            }
            Entry::Block(_,) => break,
        }
    }
    run
}

fn write_attributes<'a,>(
    out: &mut String,
    attributes: impl Iterator<Item = (&'a str, &'a Value,),> + Clone,
    depth: usize,
)
{
    let width = attributes.clone().map(|(name, _,)| key(name,).len(),).max().unwrap_or(0,);
    for (name, value,) in attributes {
        push_indent(out, depth,);
        let name = key(name,);
        out.push_str(&name,);
        for _ in name.len()..width {
            out.push(' ',);
        }
        out.push_str(" = ",);
        write_value(out, value, depth,);
        out.push('\n',);
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize,)
{
    match value {
        Value::String(text,) => out.push_str(&quote(text,),),
        Value::Bool(flag,) => out.push_str(if *flag { "true" } else { "false" },),
        Value::Expression(expression,) => out.push_str(expression,),
        Value::Type(keyword,) => out.push_str(keyword,),
        Value::List(items,) => {
            out.push('[',);
            for (index, item,) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ",);
                }
                write_value(out, item, depth,);
            }
            out.push(']',);
        }
        Value::Object(entries,) if entries.is_empty() => out.push_str("{}",),
        Value::Object(entries,) => {
            out.push_str("{\n",);
            write_attributes(out, entries.iter().map(|(name, value,)| (name.as_str(), value,),), depth + 1,);
            push_indent(out, depth,);
            out.push('}',);
        }
    }
}

fn push_indent(out: &mut String, depth: usize,)
{
    for _ in 0..depth {
        out.push_str(INDENT,);
    }
}

/// Object keys and attribute names are emitted bare when they are valid
/// identifiers and quoted otherwise.
fn key(name: &str,) -> String
{
    let bare = name.chars().next().is_some_and(|first| first.is_ascii_alphabetic() || first == '_',)
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-',);
    if bare { name.to_owned() } else { quote(name,) }
}

/// Quotes a string literal, escaping template sequences.
pub(crate) fn quote(text: &str,) -> String
{
    let mut quoted = String::with_capacity(text.len() + 2,);
    quoted.push('"',);
    let mut chars = text.chars().peekable();
    while let Some(ch,) = chars.next() {
        match ch {
            '\\' => quoted.push_str("\\\\",),
            '"' => quoted.push_str("\\\"",),
            '\n' => quoted.push_str("\\n",),
            '\r' => quoted.push_str("\\r",),
            '\t' => quoted.push_str("\\t",),
            '$' | '%' if chars.peek() == Some(&'{',) => {
                quoted.push(ch,);
                quoted.push(ch,);
            }
            other => quoted.push(other,),
        }
    }
    quoted.push('"',);
    quoted
}
