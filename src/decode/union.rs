//! Union resolution.
//!
//! Decides which member of a union a JSON node represents. Three tiers are
//! tried in order, and a failure in one tier only moves resolution on to the
//! next:
//!
//! 1. **Optional shortcut** - a union with exactly one non-null member is an
//!    optional `T`: JSON `null` is the null member, anything else is decoded
//!    directly as `T`.
//! 2. **Wrapped value** - `{"<member full name>": value}` names the member
//!    explicitly.
//! 3. **Ordered fallback** - members are tried in declaration order and the
//!    first that decodes wins. With `strict_unions`, every member is tried and
//!    more than one success is an error.

use serde_json::Value as Json;

use super::DecodeContext;
use crate::schema::{Schema, UnionSchema};
use crate::types::{Error, Result};
use crate::value::Value;

impl<'a> DecodeContext<'a> {
    pub(super) fn resolve_union(&self, node: &Json, union: &'a UnionSchema, depth: usize) -> Result<Value> {
        let mut tried = None;

        if let Some((index, member)) = union.sole_non_null_member() {
            if node.is_null() && union.has_null() {
                return Ok(Value::Null);
            }
            match self.attempt(node, member, depth)? {
                Some(value) => {
                    tracing::trace!(union = %union, member = member.full_name(), "optional shortcut");
                    return Ok(value);
                }
                None => tried = Some(index),
            }
        }

        if let Some((key, inner)) = single_entry(node) {
            if let Some((_, member)) = union.member_by_name(key) {
                if let Some(value) = self.attempt(inner, member, depth)? {
                    tracing::trace!(union = %union, member = key, "wrapped value");
                    return Ok(value);
                }
            }
        }

        if self.decoder.config.strict_unions {
            return self.resolve_strict(node, union, tried, depth);
        }

        for (index, member) in union.members().iter().enumerate() {
            if Some(index) == tried {
                continue;
            }
            if let Some(value) = self.attempt(node, member, depth)? {
                tracing::trace!(union = %union, member = member.full_name(), "ordered fallback");
                return Ok(value);
            }
        }

        tracing::debug!(union = %union, "no union member matched");
        Err(Error::unresolved_union(node, union.to_string()))
    }

    /// Ordered fallback that refuses to choose between several matches.
    fn resolve_strict(
        &self,
        node: &Json,
        union: &'a UnionSchema,
        tried: Option<usize>,
        depth: usize,
    ) -> Result<Value> {
        let mut matches: Vec<(&Schema, Value)> = Vec::new();
        for (index, member) in union.members().iter().enumerate() {
            if Some(index) == tried {
                continue;
            }
            if let Some(value) = self.attempt(node, member, depth)? {
                matches.push((member, value));
            }
        }

        if matches.len() > 1 {
            return Err(Error::AmbiguousUnion {
                node: node.to_string(),
                candidates: matches
                    .iter()
                    .map(|(member, _)| member.full_name().to_string())
                    .collect(),
            });
        }
        match matches.pop() {
            Some((_, value)) => Ok(value),
            None => Err(Error::unresolved_union(node, union.to_string())),
        }
    }

    /// Decode against one member. `Ok(None)` means the member does not fit and
    /// resolution may continue; errors that must not be swallowed propagate.
    fn attempt(&self, node: &Json, member: &'a Schema, depth: usize) -> Result<Option<Value>> {
        match self.decode_node(node, member, depth) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable_in_union() => {
                tracing::trace!(member = member.full_name(), error = %err, "union member rejected");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// The only key and value of a one-entry JSON object.
fn single_entry(node: &Json) -> Option<(&str, &Json)> {
    match node {
        Json::Object(obj) if obj.len() == 1 => obj.iter().next().map(|(k, v)| (k.as_str(), v)),
        _ => None,
    }
}
