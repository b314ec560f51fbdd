// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trigger catalog: the closed set of trigger kinds and their typed fields.
//!
//! ## Field lists
//!
//! Each kind is declared with a field list string in `name: Type` form, for example
//! `"count: u32, names: Vec<(String, u8)>"`. Commas nested inside `<..>`, `(..)` or `[..]`
//! belong to the type. Whitespace inside types is normalized to single spaces.
//! An empty string declares a kind without fields.
//!
//! The field types are descriptive: the runtime carries payloads as the application's own
//! type and never inspects them.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{BuildError, FieldError};
use crate::types::TriggerKind;

/// A single named, typed field of a trigger kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// Field name (an identifier).
    pub name: String,
    /// Field type as written in the declaration, whitespace-normalized.
    pub ty: String,
}

/// Declaration of one trigger kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerDecl {
    /// Kind name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

/// Closed set of trigger kinds, fixed at build time.
#[derive(Clone, Debug, Default)]
pub struct TriggerCatalog {
    decls: Vec<TriggerDecl>,
    by_name: BTreeMap<String, TriggerKind>,
}

impl TriggerCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new kind from its name and field list.
    pub fn declare(&mut self, name: &str, fields: &str) -> Result<TriggerKind, BuildError> {
        if self.by_name.contains_key(name) {
            return Err(BuildError::DuplicateTrigger(name.to_string()));
        }
        if u32::try_from(self.decls.len()).is_err() {
            return Err(BuildError::TooLarge("trigger kinds"));
        }
        let fields = parse_fields(fields).map_err(|source| BuildError::Fields {
            trigger: name.to_string(),
            source,
        })?;
        let kind = TriggerKind::new(self.decls.len());
        self.decls.push(TriggerDecl {
            name: name.to_string(),
            fields,
        });
        self.by_name.insert(name.to_string(), kind);
        Ok(kind)
    }

    /// Number of declared kinds.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Whether no kind is declared.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Whether `kind` belongs to this catalog.
    pub fn contains(&self, kind: TriggerKind) -> bool {
        kind.index() < self.decls.len()
    }

    /// Look up a kind by name.
    pub fn find(&self, name: &str) -> Option<TriggerKind> {
        self.by_name.get(name).copied()
    }

    /// Declaration of `kind`.
    ///
    /// Panics if `kind` is not part of this catalog.
    pub fn decl(&self, kind: TriggerKind) -> &TriggerDecl {
        assert!(self.contains(kind), "unknown trigger kind {kind:?}");
        &self.decls[kind.index()]
    }

    /// Name of `kind`.
    pub fn name(&self, kind: TriggerKind) -> &str {
        &self.decl(kind).name
    }

    /// All kinds with their declarations, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (TriggerKind, &TriggerDecl)> + '_ {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (TriggerKind::new(i), d))
    }
}

// Allowed besides letters, digits and whitespace.
const TYPE_PUNCTUATION: &[char] = &['_', '<', '>', ':', '&', '(', ')', '[', ']', ';', ',', '\''];

/// Parse a field list such as `"id: u32, tags: Vec<String>"`.
pub fn parse_fields(decl: &str) -> Result<Vec<Field>, FieldError> {
    if decl.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut fields: Vec<Field> = Vec::new();
    for raw in split_fields(decl)? {
        let field = parse_field(&raw)?;
        if fields.iter().any(|f| f.name == field.name) {
            return Err(FieldError::Duplicate { field: field.name });
        }
        fields.push(field);
    }
    Ok(fields)
}

/// Split at commas that are not nested in brackets, normalizing whitespace in each piece.
fn split_fields(decl: &str) -> Result<Vec<String>, FieldError> {
    let mut out = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut start = 0;
    for (index, ch) in decl.char_indices() {
        if !ch.is_alphanumeric() && !ch.is_whitespace() && !TYPE_PUNCTUATION.contains(&ch) {
            return Err(FieldError::InvalidChar { index, ch });
        }
        match ch {
            '<' | '(' | '[' => stack.push(ch),
            '>' | ')' | ']' => {
                let open = match ch {
                    '>' => '<',
                    ')' => '(',
                    _ => '[',
                };
                if stack.pop() != Some(open) {
                    return Err(FieldError::UnopenedBracket { index, ch });
                }
            }
            ',' if stack.is_empty() => {
                out.push(normalize(&decl[start..index]));
                start = index + 1;
            }
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(FieldError::Unterminated);
    }
    out.push(normalize(&decl[start..]));
    Ok(out)
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_field(raw: &str) -> Result<Field, FieldError> {
    let malformed = || FieldError::Malformed {
        field: raw.to_string(),
    };
    // The first single colon separates name from type; `::` belongs to paths.
    let colon = raw.find(':').ok_or_else(malformed)?;
    if raw[colon..].starts_with("::") {
        return Err(malformed());
    }
    let name = raw[..colon].trim();
    let ty = raw[colon + 1..].trim();
    if name.is_empty() || ty.is_empty() {
        return Err(malformed());
    }
    if let Some(ch) = name
        .chars()
        .find(|&c| !(c.is_alphanumeric() || c == '_'))
    {
        return Err(FieldError::InvalidName {
            field: name.to_string(),
            ch,
        });
    }
    Ok(Field {
        name: name.to_string(),
        ty: ty.to_string(),
    })
}
