// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Terraform JSON syntax serializer.
//!
//! Block keywords and labels become nested object keys, expressions become
//! `${...}` interpolations and the header is stored under the `//` comment
//! key that Terraform ignores.

use serde_json::{Map, Value as Json};

use super::block::{Block, Entry, Value};
use crate::error::Error;

/// Serializes `blocks` into a pretty-printed Terraform JSON document.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if the document cannot be encoded.
pub fn to_string(header: Option<&str,>, blocks: &[Block],) -> Result<String, Error,>
{
    let mut root = Map::new();
    if let Some(header,) = header {
        root.insert("//".to_owned(), Json::String(header.to_owned(),),);
    }

    for block in blocks {
        insert_block(&mut root, block,);
    }

    let mut text = serde_json::to_string_pretty(&Json::Object(root,),)?;
    text.push('\n',);
    Ok(text,)
}

fn insert_block(target: &mut Map<String, Json,>, block: &Block,)
{
    let mut cursor = child(target, block.keyword(),);
    for label in block.labels() {
        cursor = child(cursor, label,);
    }

    for entry in block.entries() {
        match entry {
            Entry::Attribute(name, value,) => {
                cursor.insert(name.clone(), to_json(value,),);
            }
            Entry::Block(nested,) => insert_block(cursor, nested,),
        }
    }
}

fn child<'map,>(map: &'map mut Map<String, Json,>, key: &str,) -> &'map mut Map<String, Json,>
{
    let slot = map.entry(key.to_owned(),).or_insert_with(|| Json::Object(Map::new(),),);
    if !slot.is_object() {
        *slot = Json::Object(Map::new(),);
    }
    match slot {
        Json::Object(inner,) => inner,
        _ => unreachable!("slot holds an object"),
    }
}

fn to_json(value: &Value,) -> Json
{
    match value {
        Value::String(text,) => Json::String(escape_template(text,),),
        Value::Bool(flag,) => Json::Bool(*flag,),
        Value::Expression(expression,) => Json::String(format!("${{{expression}}}"),),
        Value::Type(keyword,) => Json::String((*keyword).to_owned(),),
        Value::List(items,) => Json::Array(items.iter().map(to_json,).collect(),),
        Value::Object(entries,) => {
            Json::Object(entries.iter().map(|(name, value,)| (name.clone(), to_json(value,),),).collect(),)
        }
    }
}

/// JSON string values are templates; literal `${` and `%{` must be doubled.
fn escape_template(text: &str,) -> String
{
    text.replace("${", "$${",).replace("%{", "%%{",)
}
