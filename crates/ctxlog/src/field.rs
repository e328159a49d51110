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

//! Structured fields and the loose argument lists accepted by
//! [`Logger::with`](crate::Logger::with).

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A named, typed piece of structured data attached to a log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name as it appears in the encoded record
    pub key: String,

    /// Field value
    pub value: Value,
}

impl Field {
    /// Create a field from any serializable value
    pub fn new(key: impl Into<String>, value: impl Serialize) -> Self {
        Field {
            key: key.into(),
            value: to_value(value),
        }
    }

    /// Create a string-valued field
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Field {
            key: key.into(),
            value: Value::String(value.into()),
        }
    }
}

/// One entry of a decoration argument list.
///
/// Loose values are read as alternating name/value pairs; ready-made
/// [`Field`]s are taken as they are. Build lists with the [`args!`](crate::args)
/// macro, which accepts anything convertible into an `Arg`: fields, strings,
/// numbers, booleans and JSON values. Wrap other serializable values with
/// [`Arg::from_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A complete field
    Field(Field),

    /// A loose value, either a pair name or a pair value
    Value(Value),
}

impl Arg {
    /// Wrap any serializable value as a loose argument
    pub fn from_value(value: impl Serialize) -> Self {
        Arg::Value(to_value(value))
    }

    fn into_value(self) -> Value {
        match self {
            Arg::Value(value) => value,
            Arg::Field(field) => {
                let mut map = serde_json::Map::with_capacity(1);
                map.insert(field.key, field.value);
                Value::Object(map)
            }
        }
    }
}

impl From<Field> for Arg {
    fn from(field: Field) -> Self {
        Arg::Field(field)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Value(Value::from(value.as_str()))
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(Value::from(value))
                }
            }
        )+
    };
}

impl_from_scalar!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &str,
);

/// Serialize `value`, recording the serializer error in place of values that
/// cannot be represented (maps with non-string keys, for instance).
pub(crate) fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| Value::String(format!("<unserializable: {}>", err)))
}

/// Result of pairing a loose argument list.
#[derive(Debug, Default)]
pub(crate) struct Sweetened {
    pub fields: Vec<Field>,
    /// Final name that had no value after it
    pub dangling: Option<Value>,
    /// Pairs dropped because their name was not a string
    pub invalid: Vec<(Value, Value)>,
}

pub(crate) fn sweeten(args: Vec<Arg>) -> Sweetened {
    let mut out = Sweetened::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let key = match arg {
            Arg::Field(field) => {
                out.fields.push(field);
                continue;
            }
            Arg::Value(key) => key,
        };

        let Some(value) = args.next() else {
            out.dangling = Some(key);
            break;
        };

        match key {
            Value::String(key) => out.fields.push(Field {
                key,
                value: value.into_value(),
            }),
            key => out.invalid.push((key, value.into_value())),
        }
    }

    out
}

/// Renders a list of operands separated by single spaces.
///
/// ```ignore
/// logger.info(Sprint(&[&"retrying", &attempt, &"of", &max]));
/// ```
pub struct Sprint<'a>(pub &'a [&'a dyn fmt::Display]);

impl fmt::Display for Sprint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, operand) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", operand)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pairs_become_fields() {
        let out = sweeten(vec![
            Arg::from_value("user"),
            Arg::from_value("alice"),
            Arg::from_value("attempt"),
            Arg::from_value(3),
        ]);

        assert_eq!(
            out.fields,
            vec![Field::string("user", "alice"), Field::new("attempt", 3)]
        );
        assert!(out.dangling.is_none());
        assert!(out.invalid.is_empty());
    }

    #[test]
    fn test_fields_pass_through_between_pairs() {
        let out = sweeten(vec![
            Field::string("RequestID", "r1").into(),
            Arg::from_value("k"),
            Arg::from_value("v"),
        ]);

        assert_eq!(out.fields.len(), 2);
        assert_eq!(out.fields[0].key, "RequestID");
        assert_eq!(out.fields[1], Field::string("k", "v"));
    }

    #[test]
    fn test_dangling_key_is_reported() {
        let out = sweeten(vec![
            Arg::from_value("k"),
            Arg::from_value("v"),
            Arg::from_value("orphan"),
        ]);

        assert_eq!(out.fields.len(), 1);
        assert_eq!(out.dangling, Some(json!("orphan")));
    }

    #[test]
    fn test_non_string_key_is_reported() {
        let out = sweeten(vec![Arg::from_value(42), Arg::from_value("v")]);

        assert!(out.fields.is_empty());
        assert_eq!(out.invalid, vec![(json!(42), json!("v"))]);
    }

    #[test]
    fn test_unserializable_value_keeps_the_error() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "pair keys are not strings");

        match to_value(map) {
            Value::String(s) => assert!(s.starts_with("<unserializable")),
            other => panic!("unexpected value: {other}"),
        }
    }

    #[test]
    fn test_sprint_joins_with_spaces() {
        let rendered = Sprint(&[&"retrying", &2, &"of", &5]).to_string();
        assert_eq!(rendered, "retrying 2 of 5");
        assert_eq!(Sprint(&[]).to_string(), "");
    }
}
