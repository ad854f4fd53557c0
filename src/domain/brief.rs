//! Brief EAOG dialect for hand-authored fixtures.
//!
//! Brief form shortens canonical nodes in two ways:
//! - a bare string `"load"` is an instruction named `load`
//! - `{"<type>": "<name>", ...}` replaces `{"type": "<type>", "name": "<name>", ...}`
//!
//! Canonical input passes through [`normalize_brief`] unchanged. Export is always canonical;
//! [`to_brief`] exists for writing fixtures.

use serde_json::{Map, Value};

use crate::domain::kind::NodeType;

/// Convert brief-form JSON into canonical form. Values that are neither brief nor canonical are
/// returned as-is so validation can report them.
pub fn normalize_brief(value: Value) -> Value {
    match value {
        Value::String(name) => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), Value::String("instruction".to_string()));
            obj.insert("name".to_string(), Value::String(name));
            Value::Object(obj)
        }
        Value::Object(obj) => Value::Object(normalize_object(obj)),
        other => other,
    }
}

fn normalize_object(obj: Map<String, Value>) -> Map<String, Value> {
    let shorthand = if obj.contains_key("type") {
        None
    } else {
        // exactly one type-named key with a string value
        let mut keys = obj.iter().filter(|(k, v)| {
            k.parse::<NodeType>().is_ok() && v.is_string()
        });
        match (keys.next(), keys.next()) {
            (Some((k, _)), None) => Some(k.clone()),
            _ => None,
        }
    };

    let mut out = Map::with_capacity(obj.len() + 1);
    if let Some(type_key) = &shorthand {
        out.insert("type".to_string(), Value::String(type_key.clone()));
        if let Some(name) = obj.get(type_key) {
            out.insert("name".to_string(), name.clone());
        }
    }

    for (key, value) in obj {
        if shorthand.as_deref() == Some(key.as_str()) {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("children", Value::Array(children)) => {
                Value::Array(children.into_iter().map(normalize_brief).collect())
            }
            (_, value) => value,
        };
        out.insert(key, value);
    }
    out
}

/// Convert canonical JSON into brief form.
pub fn to_brief(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return value.clone();
    };
    let (Some(Value::String(node_type)), Some(name)) = (obj.get("type"), obj.get("name")) else {
        return value.clone();
    };

    let rest = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "type" && k.as_str() != "name")
        .filter(|(k, v)| !(k.as_str() == "children" && v.as_array().is_some_and(Vec::is_empty)))
        .count();
    if node_type == "instruction" && rest == 0 {
        return name.clone();
    }

    let mut out = Map::with_capacity(obj.len());
    out.insert(node_type.clone(), name.clone());
    for (key, value) in obj {
        match key.as_str() {
            "type" | "name" => {}
            "children" => {
                let children = value
                    .as_array()
                    .map(|c| c.iter().map(to_brief).collect())
                    .unwrap_or_default();
                out.insert(key.clone(), Value::Array(children));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_brief_tree_when_normalizing_then_yields_canonical() {
        let brief = json!({
            "sand": "main",
            "description": "d",
            "children": ["load", {"pfor": "each", "items": "pages", "children": ["fetch"]}]
        });

        let canonical = normalize_brief(brief);

        assert_eq!(
            canonical,
            json!({
                "type": "sand",
                "name": "main",
                "description": "d",
                "children": [
                    {"type": "instruction", "name": "load"},
                    {"type": "pfor", "name": "each", "items": "pages", "children": [
                        {"type": "instruction", "name": "fetch"}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn given_canonical_input_when_normalizing_then_unchanged() {
        let canonical = json!({
            "type": "sand",
            "name": "main",
            "children": [{"type": "instruction", "name": "load", "params": {"for": "x"}}]
        });

        assert_eq!(normalize_brief(canonical.clone()), canonical);
    }

    #[test]
    fn given_canonical_tree_when_converting_to_brief_then_normalizes_back() {
        let canonical = json!({
            "type": "cor",
            "name": "pick",
            "children": [
                {"type": "instruction", "name": "a"},
                {"type": "recursion", "name": "again", "ref": "pick"}
            ]
        });

        let brief = to_brief(&canonical);

        assert_eq!(
            brief,
            json!({"cor": "pick", "children": ["a", {"recursion": "again", "ref": "pick"}]})
        );
        assert_eq!(normalize_brief(brief), canonical);
    }
}
