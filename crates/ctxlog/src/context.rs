// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Request-scoped context.
//!
//! A [`Context`] is an immutable chain of key/value layers. Adding a value
//! produces a new context that shares every existing layer, so the original
//! stays valid and unchanged. Keys are typed: a lookup matches only a key of
//! the same type that also compares equal, which keeps keys owned by
//! unrelated code from ever colliding.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Keys under which this crate stores request identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContextKey {
    RequestId,
    CorrelationId,
}

trait Key: Send + Sync {
    fn matches(&self, other: &dyn Any) -> bool;
}

impl<K> Key for K
where
    K: Any + PartialEq + Send + Sync,
{
    fn matches(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<K>().is_some_and(|other| other == self)
    }
}

struct Layer {
    parent: Context,
    key: Box<dyn Key>,
    value: Arc<dyn Any + Send + Sync>,
}

/// Immutable request-scoped value chain.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Layer>>,
}

impl Context {
    /// An empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context that carries `value` under `key`.
    ///
    /// A later layer shadows an earlier one stored under an equal key.
    pub fn with_value<K, V>(&self, key: K, value: V) -> Context
    where
        K: Any + PartialEq + Send + Sync,
        V: Any + Send + Sync,
    {
        Context {
            head: Some(Arc::new(Layer {
                parent: self.clone(),
                key: Box::new(key),
                value: Arc::new(value),
            })),
        }
    }

    /// Look up the value stored under `key`, newest layer first.
    pub fn value<K>(&self, key: &K) -> Option<&(dyn Any + Send + Sync)>
    where
        K: Any + PartialEq + Send + Sync,
    {
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            if current.key.matches(key) {
                return Some(&*current.value);
            }
            layer = current.parent.head.as_deref();
        }
        None
    }

    /// Look up a string stored under one of this crate's keys.
    ///
    /// Values of any other type are ignored.
    pub(crate) fn string(&self, key: ContextKey) -> Option<&str> {
        self.value(&key)
            .and_then(|value| value.downcast_ref::<String>())
            .map(String::as_str)
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.head.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.head.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("layers", &self.depth())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq)]
    struct ForeignKey(u8);

    #[test]
    fn test_empty_context_has_no_values() {
        let ctx = Context::new();
        assert!(ctx.value(&ContextKey::RequestId).is_none());
        assert!(ctx.string(ContextKey::CorrelationId).is_none());
    }

    #[test]
    fn test_with_value_leaves_parent_untouched() {
        let parent = Context::new();
        let child = parent.with_value(ContextKey::RequestId, "r1".to_string());

        assert_eq!(child.string(ContextKey::RequestId), Some("r1"));
        assert!(parent.string(ContextKey::RequestId).is_none());
    }

    #[test]
    fn test_newest_layer_wins() {
        let ctx = Context::new()
            .with_value(ContextKey::RequestId, "old".to_string())
            .with_value(ContextKey::CorrelationId, "c1".to_string())
            .with_value(ContextKey::RequestId, "new".to_string());

        assert_eq!(ctx.string(ContextKey::RequestId), Some("new"));
        assert_eq!(ctx.string(ContextKey::CorrelationId), Some("c1"));
    }

    #[test]
    fn test_keys_of_other_types_never_collide() {
        // Same discriminant value, different key type.
        let ctx = Context::new()
            .with_value(0u8, "plain".to_string())
            .with_value(ForeignKey(0), "foreign".to_string())
            .with_value("RequestID", "string key".to_string());

        assert!(ctx.string(ContextKey::RequestId).is_none());
        assert!(ctx.value(&ForeignKey(1)).is_none());
        assert_eq!(
            ctx.value(&ForeignKey(0))
                .and_then(|v| v.downcast_ref::<String>())
                .map(String::as_str),
            Some("foreign")
        );
    }

    #[test]
    fn test_wrong_typed_value_is_ignored() {
        // Intentional leniency: a non-string under our key is not an error.
        let ctx = Context::new().with_value(ContextKey::RequestId, 42u64);

        assert!(ctx.value(&ContextKey::RequestId).is_some());
        assert!(ctx.string(ContextKey::RequestId).is_none());
    }

    #[test]
    fn test_debug_reports_depth() {
        let ctx = Context::new().with_value(ContextKey::RequestId, "r".to_string());
        assert!(format!("{:?}", ctx).contains("layers: 1"));
    }
}
