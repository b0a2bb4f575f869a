//! Conversion between nested configuration trees and flat path/value leaves.

use serde_json::{Map, Value};

/// A single leaf: full component path plus scalar value.
pub type Leaf = (Vec<String>, Value);

/// Flatten `tree` into one `(path, scalar)` pair per leaf, each path prefixed
/// with `prefix`.
///
/// Sequence indices and mapping keys both become path components. Empty
/// containers produce no leaves. Empty-string leaves are emitted as-is; the
/// caller decides what they mean.
pub fn flatten(tree: &Value, prefix: &[String]) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    let mut path = prefix.to_vec();
    flatten_into(tree, &mut path, &mut leaves);
    leaves
}

fn flatten_into(value: &Value, path: &mut Vec<String>, leaves: &mut Vec<Leaf>) {
    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(index.to_string());
                flatten_into(item, path, leaves);
                path.pop();
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                path.push(key.clone());
                flatten_into(item, path, leaves);
                path.pop();
            }
        }
        scalar => leaves.push((path.clone(), scalar.clone())),
    }
}

/// True if the leaf value is the "remove this key" sentinel.
pub fn is_deletion(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

/// Rebuild a tree from path/value pairs.
///
/// Later pairs win: a path that crosses an earlier scalar replaces it with a
/// mapping, and a scalar written over an earlier subtree replaces the subtree.
/// Mappings keyed exactly `"0".."n-1"` become sequences.
pub fn treeify<I, P>(pairs: I) -> Value
where
    I: IntoIterator<Item = (P, Value)>,
    P: AsRef<[String]>,
{
    let mut root = Value::Object(Map::new());
    for (path, value) in pairs {
        insert(&mut root, path.as_ref(), value);
    }
    restore_sequences(root)
}

fn insert(node: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        if rest.is_empty() {
            *child = value;
        } else {
            insert(child, rest, value);
        }
    }
}

fn restore_sequences(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_sequence = !map.is_empty()
                && (0..map.len()).all(|index| map.contains_key(&index.to_string()));
            if is_sequence {
                let mut entries: Vec<(usize, Value)> = map
                    .into_iter()
                    .filter_map(|(key, item)| key.parse::<usize>().ok().map(|i| (i, item)))
                    .collect();
                entries.sort_by_key(|(index, _)| *index);
                Value::Array(
                    entries
                        .into_iter()
                        .map(|(_, item)| restore_sequences(item))
                        .collect(),
                )
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(key, item)| (key, restore_sequences(item)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn p(components: &[&str]) -> Vec<String> {
        components.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_flatten_nested() {
        let tree = json!({"a": {"b": 1, "c": "x"}, "d": "", "e": [true, null]});
        let leaves = flatten(&tree, &p(&["cfg"]));
        assert_eq!(
            leaves,
            vec![
                (p(&["cfg", "a", "b"]), json!(1)),
                (p(&["cfg", "a", "c"]), json!("x")),
                (p(&["cfg", "d"]), json!("")),
                (p(&["cfg", "e", "0"]), json!(true)),
                (p(&["cfg", "e", "1"]), Value::Null),
            ]
        );
        assert!(is_deletion(&leaves[2].1));
        assert!(!is_deletion(&leaves[1].1));
    }

    #[test]
    fn test_flatten_skips_empty_containers() {
        let tree = json!({"a": {}, "b": [], "c": 2});
        assert_eq!(flatten(&tree, &[]), vec![(p(&["c"]), json!(2))]);
    }

    #[test]
    fn test_treeify_last_write_wins() {
        let tree = treeify(vec![
            (p(&["a", "b"]), json!(1)),
            (p(&["a", "b"]), json!(2)),
        ]);
        assert_eq!(tree, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_treeify_later_subtree_replaces_scalar() {
        let tree = treeify(vec![
            (p(&["a"]), json!("flat")),
            (p(&["a", "b"]), json!(1)),
        ]);
        assert_eq!(tree, json!({"a": {"b": 1}}));

        let tree = treeify(vec![
            (p(&["a", "b"]), json!(1)),
            (p(&["a"]), json!("flat")),
        ]);
        assert_eq!(tree, json!({"a": "flat"}));
    }

    #[test]
    fn test_treeify_restores_sequences() {
        let tree = treeify(vec![
            (p(&["servers", "1", "host"]), json!("b")),
            (p(&["servers", "0", "host"]), json!("a")),
            (p(&["sparse", "0"]), json!(1)),
            (p(&["sparse", "2"]), json!(3)),
        ]);
        assert_eq!(
            tree,
            json!({
                "servers": [{"host": "a"}, {"host": "b"}],
                "sparse": {"0": 1, "2": 3}
            })
        );
    }

    #[test]
    fn test_treeify_empty_is_empty_mapping() {
        let pairs: Vec<(Vec<String>, Value)> = Vec::new();
        assert_eq!(treeify(pairs), json!({}));
    }

    #[test]
    fn test_round_trip() {
        let trees = [
            json!({"a": 1}),
            json!({"db": {"host": "localhost", "port": 5432, "tls": false, "ratio": 0.5}}),
            json!({"list": [1, "two", {"three": 3}], "nested": {"deep": {"er": null}}}),
            json!({"numeric_string": "42", "number": 42}),
        ];
        for tree in trees {
            assert_eq!(treeify(flatten(&tree, &[])), tree);
        }
    }
}
