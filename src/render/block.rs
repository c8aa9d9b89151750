// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Format-independent model of Terraform configuration.
//!
//! Blocks are built once from the resource graph and handed to a serializer
//! for the selected syntax.

/// Attribute value.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum Value
{
    /// Quoted string literal.
    String(String,),
    /// Boolean literal.
    Bool(bool,),
    /// Reference or other expression, e.g. `var.sentry_auth_token`.
    Expression(String,),
    /// Type constraint keyword such as `string`.
    Type(&'static str,),
    /// Tuple of values.
    List(Vec<Value,>,),
    /// Object with keys in insertion order.
    Object(Vec<(String, Value,),>,),
}

impl Value
{
    /// String literal.
    pub fn string(value: impl Into<String,>,) -> Self
    {
        Self::String(value.into(),)
    }

    /// Expression rendered without quotes in native syntax.
    pub fn expression(value: impl Into<String,>,) -> Self
    {
        Self::Expression(value.into(),)
    }

    /// Whether the value spans several lines in native syntax.
    pub(crate) fn is_multiline(&self,) -> bool
    {
        matches!(self, Self::Object(entries) if !entries.is_empty())
    }
}

/// Item of a block body.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum Entry
{
    /// `name = value`
    Attribute(String, Value,),
    /// Nested block.
    Block(Block,),
}

/// Block with a keyword, zero or more labels and a body.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Block
{
    keyword: &'static str,
    labels:  Vec<String,>,
    entries: Vec<Entry,>,
}

impl Block
{
    /// Creates an empty block.
    pub fn new(keyword: &'static str, labels: &[&str],) -> Self
    {
        Self {
            keyword, labels: labels.iter().map(|label| (*label).to_owned(),).collect(), entries: Vec::new(),
        }
    }

    /// `resource "<kind>" "<name>"` block.
    pub fn resource(kind: &str, name: &str,) -> Self
    {
        Self::new("resource", &[kind, name],)
    }

    /// Appends an attribute.
    pub fn attribute(mut self, name: &str, value: Value,) -> Self
    {
        self.entries.push(Entry::Attribute(name.to_owned(), value,),);
        self
    }

    /// Appends a nested block.
    pub fn block(mut self, block: Block,) -> Self
    {
        self.entries.push(Entry::Block(block,),);
        self
    }

    /// Block keyword, e.g. `resource`.
    pub fn keyword(&self,) -> &str
    {
        self.keyword
    }

    /// Block labels.
    pub fn labels(&self,) -> &[String]
    {
        &self.labels
    }

    /// Body entries in insertion order.
    pub fn entries(&self,) -> &[Entry]
    {
        &self.entries
    }

    /// Terraform address of a `resource` block, e.g. `sentry_team.backend`.
    pub fn address(&self,) -> Option<String,>
    {
        match (self.keyword, self.labels.as_slice(),) {
            ("resource", [kind, name],) => Some(format!("{kind}.{name}"),),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn address_is_only_defined_for_resources()
    {
        assert_eq!(Block::resource("sentry_team", "backend",).address().as_deref(), Some("sentry_team.backend"));
        assert_eq!(Block::new("data", &["sentry_organization", "acme"],).address(), None);
    }

    #[test]
    fn empty_objects_stay_on_one_line()
    {
        assert!(!Value::Object(Vec::new(),).is_multiline());
        assert!(Value::Object(vec![("a".to_owned(), Value::Bool(true,),)],).is_multiline());
        assert!(!Value::List(vec![Value::string("x",)],).is_multiline());
    }
}
