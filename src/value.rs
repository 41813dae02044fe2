use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// Property names that the ingest backend requires verbatim at the top
/// level of a record. Top-level properties with these names bypass the
/// configured properties prefix and are emitted under their bare name.
pub const ROOT_PROPERTIES: &[&str] = &[
    "trace_id",
    "span_id",
    "trace_sampled",
    "dt.entity.host",
    "dt.entity.process_group_instance",
];

/// Whether `name` belongs to the root-property passthrough list.
pub fn is_root_property(name: &str) -> bool {
    ROOT_PROPERTIES.contains(&name)
}

/// A primitive log property value, rendered via its string conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Uint(u) => write!(f, "{}", u),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<u64> for Scalar {
    fn from(u: u64) -> Self {
        Scalar::Uint(u)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// A structured property value bound to a log record.
///
/// Closed sum over the shapes a property can take. `Structure` keeps its
/// members in declaration order; `Dictionary` keys are stringified at
/// construction time and kept in insertion order, so flattening is stable.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    Scalar(Scalar),
    Sequence(Vec<StructuredValue>),
    Structure(Vec<(String, StructuredValue)>),
    Dictionary(Vec<(String, StructuredValue)>),
}

impl StructuredValue {
    /// Shorthand for a scalar value.
    pub fn scalar(s: impl Into<Scalar>) -> Self {
        StructuredValue::Scalar(s.into())
    }

    /// Compact display form used when substituting a template placeholder
    /// with a non-scalar value.
    pub(crate) fn render_compact(&self, out: &mut String) {
        match self {
            StructuredValue::Scalar(s) => out.push_str(&s.to_string()),
            StructuredValue::Sequence(items) => {
                out.push('[');
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    v.render_compact(out);
                }
                out.push(']');
            }
            StructuredValue::Structure(members) | StructuredValue::Dictionary(members) => {
                out.push('{');
                for (i, (name, v)) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push_str(": ");
                    v.render_compact(out);
                }
                out.push('}');
            }
        }
    }
}

impl Serialize for StructuredValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StructuredValue::Scalar(Scalar::Null) => serializer.serialize_unit(),
            StructuredValue::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            StructuredValue::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            StructuredValue::Scalar(Scalar::Uint(u)) => serializer.serialize_u64(*u),
            StructuredValue::Scalar(Scalar::Float(x)) => serializer.serialize_f64(*x),
            StructuredValue::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            StructuredValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for v in items {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            StructuredValue::Structure(members) | StructuredValue::Dictionary(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (name, v) in members {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for StructuredValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => StructuredValue::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => StructuredValue::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    StructuredValue::Scalar(Scalar::Int(i))
                } else if let Some(u) = n.as_u64() {
                    StructuredValue::Scalar(Scalar::Uint(u))
                } else {
                    StructuredValue::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => StructuredValue::Scalar(Scalar::String(s)),
            serde_json::Value::Array(items) => {
                StructuredValue::Sequence(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => StructuredValue::Dictionary(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Recursively flatten `value` under `key`, emitting one `(path, string)`
/// pair per scalar leaf.
///
/// Sequence elements use their 0-based index as the path segment,
/// Structure/Dictionary members use their name; segments are joined with
/// `.`. Depth is bounded only by the call stack. Pairs are pushed into the
/// emitter so deeply nested input never allocates an intermediate tree.
pub fn flatten_into<F>(value: &StructuredValue, key: &str, emit: &mut F)
where
    F: FnMut(&str, String),
{
    match value {
        StructuredValue::Scalar(s) => emit(key, s.to_string()),
        StructuredValue::Sequence(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(v, &format!("{}.{}", key, i), emit);
            }
        }
        StructuredValue::Structure(members) | StructuredValue::Dictionary(members) => {
            for (name, v) in members {
                flatten_into(v, &format!("{}.{}", key, name), emit);
            }
        }
    }
}

/// Collect the flattened pairs of `value` under `key` into a vector.
pub fn flatten(value: &StructuredValue, key: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into(value, key, &mut |k, v| pairs.push((k.to_string(), v)));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_flattens_to_single_pair_under_any_prefix() {
        for prefix in ["attr.user", "x", ""] {
            let pairs = flatten(&StructuredValue::scalar(42i64), prefix);
            assert_eq!(pairs, vec![(prefix.to_string(), "42".to_string())]);
        }
    }

    #[test]
    fn null_scalar_renders_as_null() {
        let pairs = flatten(&StructuredValue::Scalar(Scalar::Null), "attr.x");
        assert_eq!(pairs, vec![("attr.x".to_string(), "null".to_string())]);
    }

    #[test]
    fn sequence_uses_zero_based_index_segments() {
        let seq = StructuredValue::Sequence(vec![
            StructuredValue::scalar("a"),
            StructuredValue::scalar("b"),
            StructuredValue::scalar("c"),
        ]);
        let pairs = flatten(&seq, "attr.items");
        assert_eq!(
            pairs,
            vec![
                ("attr.items.0".to_string(), "a".to_string()),
                ("attr.items.1".to_string(), "b".to_string()),
                ("attr.items.2".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn structure_members_keep_declaration_order() {
        let value = StructuredValue::Structure(vec![
            ("name".to_string(), StructuredValue::scalar("alice")),
            ("age".to_string(), StructuredValue::scalar(30i64)),
        ]);
        let pairs = flatten(&value, "attr.user");
        assert_eq!(
            pairs,
            vec![
                ("attr.user.name".to_string(), "alice".to_string()),
                ("attr.user.age".to_string(), "30".to_string()),
            ]
        );
    }

    #[test]
    fn nested_mixed_shapes_join_segments_with_dots() {
        let value = StructuredValue::Dictionary(vec![(
            "servers".to_string(),
            StructuredValue::Sequence(vec![StructuredValue::Structure(vec![(
                "port".to_string(),
                StructuredValue::scalar(8080u64),
            )])]),
        )]);
        let pairs = flatten(&value, "attr.cfg");
        assert_eq!(
            pairs,
            vec![("attr.cfg.servers.0.port".to_string(), "8080".to_string())]
        );
    }

    #[test]
    fn json_values_convert_losslessly_enough_to_flatten() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a":[1,true,"x"],"b":null}"#).unwrap();
        let value = StructuredValue::from(json);
        let pairs = flatten(&value, "attr.v");
        assert_eq!(
            pairs,
            vec![
                ("attr.v.a.0".to_string(), "1".to_string()),
                ("attr.v.a.1".to_string(), "true".to_string()),
                ("attr.v.a.2".to_string(), "x".to_string()),
                ("attr.v.b".to_string(), "null".to_string()),
            ]
        );
    }

    #[test]
    fn root_property_list_contains_trace_fields() {
        assert!(is_root_property("trace_id"));
        assert!(is_root_property("span_id"));
        assert!(is_root_property("trace_sampled"));
        assert!(!is_root_property("user_id"));
    }

    #[test]
    fn serializes_to_natural_json_shapes() {
        let value = StructuredValue::Structure(vec![
            ("n".to_string(), StructuredValue::scalar(1i64)),
            (
                "xs".to_string(),
                StructuredValue::Sequence(vec![StructuredValue::scalar(true)]),
            ),
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"n":1,"xs":[true]}"#
        );
    }
}
