//! Normalizes raw backend records into a forest of [`TreeNode`].
//!
//! Records may arrive already nested (each carrying a children array) or as
//! a flat listing with parent references. Either way the result is a forest
//! whose keys are derived from the parent key, the record id and the
//! record's position, so the same snapshot always produces the same keys.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::fields::FieldMap;
use crate::model::TreeNode;

/// Deepest level ever built, so that no input can recurse without bound.
/// Parsed JSON can't nest deeper than this anyway (serde_json's own
/// recursion limit), but a flat listing with parent references can.
pub const NESTING_LIMIT: usize = 128;

/// Non-fatal problems found while building a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// Children below `key` (at `depth`) were discarded by the depth cap.
    DepthTruncated {
        key: String,
        depth: usize,
        dropped: usize,
    },
    /// Flat records whose parent chain never reaches a root.
    Unreachable { count: usize },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthTruncated {
                key,
                depth,
                dropped,
            } => write!(
                f,
                "depth limit reached at '{key}' (depth {depth}); dropped {dropped} record(s)"
            ),
            Self::Unreachable { count } => {
                write!(f, "{count} record(s) sit in a parent cycle and were dropped")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub forest: Vec<TreeNode>,
    pub warnings: Vec<BuildWarning>,
}

/// Build a forest with no configured depth cap, discarding warnings.
pub fn build_forest(raw: &Value, fields: &FieldMap) -> Vec<TreeNode> {
    Builder::new(fields).build(raw).forest
}

pub struct Builder<'a> {
    fields: &'a FieldMap,
    max_depth: Option<usize>,
}

impl<'a> Builder<'a> {
    pub fn new(fields: &'a FieldMap) -> Self {
        Self {
            fields,
            max_depth: None,
        }
    }

    /// Cap the number of levels kept. Roots are depth 1. The cap never
    /// exceeds [`NESTING_LIMIT`].
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(&self, raw: &Value) -> BuildOutcome {
        let Value::Array(records) = raw else {
            debug!("snapshot is not an array; treating as empty");
            return BuildOutcome::default();
        };

        let mut warnings = Vec::new();
        let forest = if self.fields.parent_field.is_some() {
            let links = FlatLinks::new(records, self.fields);
            let unreachable = links.unreachable();
            if unreachable > 0 {
                warnings.push(BuildWarning::Unreachable { count: unreachable });
            }
            links
                .roots
                .iter()
                .enumerate()
                .map(|(index, &i)| {
                    self.build_node(&records[i], "", index, 1, Some((&links, i)), &mut warnings)
                })
                .collect()
        } else {
            self.build_level(records, "", 1, &mut warnings)
        };

        for w in &warnings {
            warn!("{w}");
        }
        BuildOutcome { forest, warnings }
    }

    /// Deepest level that gets children, whatever the configured cap.
    fn depth_limit(&self) -> usize {
        self.max_depth.map_or(NESTING_LIMIT, |max| max.min(NESTING_LIMIT))
    }

    fn build_level(
        &self,
        records: &[Value],
        parent_key: &str,
        depth: usize,
        warnings: &mut Vec<BuildWarning>,
    ) -> Vec<TreeNode> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.build_node(record, parent_key, index, depth, None, warnings)
            })
            .collect()
    }

    /// Build one node. `flat` carries the parent links and this record's
    /// position when the snapshot is a flat listing; linked children follow
    /// any children nested in the record itself.
    fn build_node(
        &self,
        record: &Value,
        parent_key: &str,
        index: usize,
        depth: usize,
        flat: Option<(&FlatLinks<'_>, usize)>,
        warnings: &mut Vec<BuildWarning>,
    ) -> TreeNode {
        let empty = Map::new();
        let record = match record {
            Value::Object(map) => map,
            other => {
                debug!("record {index} under '{parent_key}' is not an object: {other}");
                &empty
            }
        };

        let id = self.fields.id_of(record);
        let key = node_key(parent_key, id.as_deref(), index);
        let nested = self.fields.children_of(record).unwrap_or(&[]);
        let linked = flat.map_or(&[][..], |(links, i)| links.children[i].as_slice());

        let children = if nested.is_empty() && linked.is_empty() {
            Vec::new()
        } else if depth >= self.depth_limit() {
            let dropped = count_records(nested, self.fields)
                + flat.map_or(0, |(links, _)| links.subtree_size(linked));
            warnings.push(BuildWarning::DepthTruncated {
                key: key.clone(),
                depth,
                dropped,
            });
            Vec::new()
        } else {
            let mut children = self.build_level(nested, &key, depth + 1, warnings);
            if let Some((links, _)) = flat {
                let offset = children.len();
                for (n, &j) in linked.iter().enumerate() {
                    let child = self.build_node(
                        &links.records[j],
                        &key,
                        offset + n,
                        depth + 1,
                        Some((links, j)),
                        warnings,
                    );
                    children.push(child);
                }
            }
            children
        };

        TreeNode {
            key,
            display_name: self.fields.name_of(record),
            id,
            children,
        }
    }
}

/// Key for the `index`-th child of `parent_key`.
pub fn node_key(parent_key: &str, id: Option<&str>, index: usize) -> String {
    match id {
        Some(id) => format!("{parent_key}/{}#{index}", escape_segment(id)),
        None => format!("{parent_key}/#{index}"),
    }
}

/// Percent-escape the key separators so ids can't forge another node's key.
fn escape_segment(id: &str) -> Cow<'_, str> {
    if !id.contains(['%', '/', '#']) {
        return Cow::Borrowed(id);
    }
    let mut out = String::with_capacity(id.len() + 4);
    for c in id.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '#' => out.push_str("%23"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn count_records(records: &[Value], fields: &FieldMap) -> usize {
    records
        .iter()
        .map(|r| {
            let nested = match r {
                Value::Object(map) => fields.children_of(map).unwrap_or(&[]),
                _ => &[],
            };
            1 + count_records(nested, fields)
        })
        .sum()
}

/// Parent links of a flat listing, by record position.
///
/// A record's parent is the first record whose id equals its parent
/// reference. Records whose parent is missing from the listing (or is the
/// record itself) are roots. Every record has at most one parent, so the
/// records reachable from the roots form a forest and the rest sit on
/// parent cycles.
struct FlatLinks<'r> {
    records: &'r [Value],
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl<'r> FlatLinks<'r> {
    fn new(records: &'r [Value], fields: &FieldMap) -> Self {
        let objects: Vec<Option<&Map<String, Value>>> =
            records.iter().map(Value::as_object).collect();

        let mut index_of: HashMap<String, usize> = HashMap::new();
        for (i, obj) in objects.iter().enumerate() {
            if let Some(id) = obj.and_then(|o| fields.id_of(o)) {
                index_of.entry(id).or_insert(i);
            }
        }

        let mut roots = Vec::new();
        let mut children = vec![Vec::new(); records.len()];
        for (i, obj) in objects.iter().enumerate() {
            let parent = obj
                .and_then(|o| fields.parent_of(o))
                .and_then(|p| index_of.get(&p).copied())
                .filter(|&p| p != i);
            match parent {
                Some(p) => children[p].push(i),
                None => roots.push(i),
            }
        }

        Self {
            records,
            roots,
            children,
        }
    }

    /// Number of records in the subtrees under `start`, counting `start`.
    fn subtree_size(&self, start: &[usize]) -> usize {
        let mut stack = start.to_vec();
        let mut count = 0;
        while let Some(i) = stack.pop() {
            count += 1;
            stack.extend_from_slice(&self.children[i]);
        }
        count
    }

    fn unreachable(&self) -> usize {
        self.records.len() - self.subtree_size(&self.roots)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model;
    use serde_json::json;

    fn ledger() -> FieldMap {
        FieldMap::builtin("ledger-group").unwrap()
    }

    #[test]
    fn nested_assets_and_cash() {
        let raw = json!([{"fAcname": "Assets", "fcode": "1", "children": [{"fAcname": "Cash", "fcode": "1.1"}]}]);
        let forest = build_forest(&raw, &ledger());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].display_name, "Assets");
        assert_eq!(forest[0].id.as_deref(), Some("1"));
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].display_name, "Cash");
        assert_ne!(forest[0].key, forest[0].children[0].key);
        assert_eq!(forest[0].key, "/1#0");
        assert_eq!(forest[0].children[0].key, "/1#0/1.1#0");
    }

    #[test]
    fn empty_and_non_array_input() {
        assert!(build_forest(&json!([]), &ledger()).is_empty());
        assert!(build_forest(&Value::Null, &ledger()).is_empty());
        assert!(build_forest(&json!({"fAcname": "x"}), &ledger()).is_empty());
        assert!(build_forest(&json!("text"), &ledger()).is_empty());
    }

    #[test]
    fn missing_name_gets_placeholder() {
        let fields = FieldMap::builtin("ledger").unwrap();
        let forest = build_forest(&json!([{"fcode": "9"}]), &fields);
        assert_eq!(forest[0].display_name, "Unnamed Group");
        assert_eq!(forest[0].id.as_deref(), Some("9"));
    }

    #[test]
    fn non_object_record_is_placeholder_leaf() {
        let forest = build_forest(&json!([42, null]), &ledger());
        assert_eq!(forest.len(), 2);
        assert!(forest.iter().all(|n| n.display_name == "Unnamed"));
        assert!(forest.iter().all(|n| n.id.is_none() && n.is_leaf()));
        assert_ne!(forest[0].key, forest[1].key);
    }

    #[test]
    fn non_array_children_is_leaf() {
        let forest = build_forest(&json!([{"fAcname": "A", "children": {"x": 1}}]), &ledger());
        assert!(forest[0].is_leaf());
    }

    #[test]
    fn keys_unique_with_colliding_ids() {
        let raw = json!([
            {"fAcname": "A", "fcode": "1", "children": [{"fcode": "1"}, {"fcode": "1"}, {}]},
            {"fAcname": "B", "fcode": "1"},
            {"fAcname": "C"},
            {"fAcname": "D", "fcode": "1#0/1"},
        ]);
        let forest = build_forest(&raw, &ledger());
        let keys = model::keys(&forest);
        let unique: HashSet<&str> = keys.iter().copied().collect();
        assert_eq!(keys.len(), 7);
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn separator_ids_cannot_forge_keys() {
        // "1#0/x" as a root id must not collide with child "x" of root "1".
        let raw = json!([
            {"fcode": "1", "children": [{"fcode": "x"}]},
            {"fcode": "1#0/x"},
        ]);
        let forest = build_forest(&raw, &ledger());
        let child = &forest[0].children[0].key;
        assert_eq!(child, "/1#0/x#0");
        assert_eq!(forest[1].key, "/1%230%2Fx#1");
    }

    #[test]
    fn deterministic() {
        let raw = json!([{"fAcname": "A", "children": [{"fAcname": "B"}, {"fcode": 3}]}]);
        assert_eq!(build_forest(&raw, &ledger()), build_forest(&raw, &ledger()));
    }

    #[test]
    fn input_order_preserved() {
        let raw = json!([{"fAcname": "Zeta"}, {"fAcname": "Alpha"}, {"fAcname": "Mid"}]);
        let names: Vec<String> = build_forest(&raw, &ledger())
            .into_iter()
            .map(|n| n.display_name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn depth_cap_truncates_and_warns() {
        let raw = json!([{"fAcname": "L1", "children": [
            {"fAcname": "L2", "children": [
                {"fAcname": "L3", "children": [{"fAcname": "L4"}]}
            ]}
        ]}]);
        let fields = ledger();
        let outcome = Builder::new(&fields).max_depth(Some(2)).build(&raw);
        let l2 = &outcome.forest[0].children[0];
        assert_eq!(l2.display_name, "L2");
        assert!(l2.is_leaf());
        assert_eq!(
            outcome.warnings,
            vec![BuildWarning::DepthTruncated {
                key: l2.key.clone(),
                depth: 2,
                dropped: 2,
            }]
        );
    }

    #[test]
    fn unlimited_depth_has_no_warnings() {
        let raw = json!([{"children": [{"children": [{"children": [{}]}]}]}]);
        let fields = ledger();
        let outcome = Builder::new(&fields).build(&raw);
        assert!(outcome.warnings.is_empty());
        assert_eq!(model::node_count(&outcome.forest), 4);
    }

    fn flat_fields() -> FieldMap {
        FieldMap::new(&["name"], &["code"]).with_parent_field("parent")
    }

    #[test]
    fn flat_records_are_nested() {
        let raw = json!([
            {"name": "Cash", "code": "2", "parent": "1"},
            {"name": "Assets", "code": "1"},
            {"name": "Bank", "code": "3", "parent": "1"},
            {"name": "Petty", "code": "4", "parent": "2"},
        ]);
        let forest = build_forest(&raw, &flat_fields());
        assert_eq!(forest.len(), 1);
        let assets = &forest[0];
        assert_eq!(assets.display_name, "Assets");
        let kids: Vec<&str> = assets.children.iter().map(|n| n.display_name.as_str()).collect();
        assert_eq!(kids, vec!["Cash", "Bank"]);
        assert_eq!(assets.children[0].children[0].display_name, "Petty");
    }

    #[test]
    fn flat_orphans_promoted_to_roots() {
        let raw = json!([
            {"name": "Orphan", "code": "5", "parent": "missing"},
            {"name": "Self", "code": "6", "parent": "6"},
            {"name": "Blank", "code": "7", "parent": ""},
        ]);
        let outcome = Builder::new(&flat_fields()).build(&raw);
        assert_eq!(outcome.forest.len(), 3);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn flat_cycle_is_dropped_and_reported() {
        let raw = json!([
            {"name": "Root", "code": "1"},
            {"name": "A", "code": "2", "parent": "3"},
            {"name": "B", "code": "3", "parent": "2"},
        ]);
        let outcome = Builder::new(&flat_fields()).build(&raw);
        assert_eq!(outcome.forest.len(), 1);
        assert_eq!(outcome.warnings, vec![BuildWarning::Unreachable { count: 2 }]);
    }

    fn flat_chain(len: usize) -> Value {
        Value::Array(
            (0..len)
                .map(|i| match i {
                    0 => json!({"name": "Top", "code": 0}),
                    _ => json!({"code": i, "parent": i - 1}),
                })
                .collect(),
        )
    }

    fn deepest(forest: &[TreeNode]) -> usize {
        let mut level = forest;
        let mut depth = 0;
        while let Some(node) = level.first() {
            depth += 1;
            level = &node.children;
        }
        depth
    }

    #[test]
    fn flat_chain_stops_at_depth_cap() {
        let fields = flat_fields();
        let outcome = Builder::new(&fields).max_depth(Some(8)).build(&flat_chain(10_000));
        assert_eq!(model::node_count(&outcome.forest), 8);
        assert_eq!(deepest(&outcome.forest), 8);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            BuildWarning::DepthTruncated {
                depth: 8,
                dropped: 9_992,
                ..
            }
        ));
    }

    #[test]
    fn uncapped_flat_chain_stops_at_nesting_limit() {
        let fields = flat_fields();
        let outcome = Builder::new(&fields).build(&flat_chain(10_000));
        assert_eq!(deepest(&outcome.forest), NESTING_LIMIT);
        assert_eq!(
            outcome.warnings,
            vec![BuildWarning::DepthTruncated {
                key: model::keys(&outcome.forest)[NESTING_LIMIT - 1].to_string(),
                depth: NESTING_LIMIT,
                dropped: 10_000 - NESTING_LIMIT,
            }]
        );
    }

    #[test]
    fn cap_above_nesting_limit_is_clamped() {
        let fields = flat_fields();
        let outcome = Builder::new(&fields)
            .max_depth(Some(NESTING_LIMIT * 2))
            .build(&flat_chain(NESTING_LIMIT + 5));
        assert_eq!(deepest(&outcome.forest), NESTING_LIMIT);
    }

    #[test]
    fn deep_nested_value_stops_at_nesting_limit() {
        let mut raw = json!({"fAcname": "Leaf"});
        for _ in 0..NESTING_LIMIT + 10 {
            raw = json!({"fAcname": "Level", "children": [raw]});
        }
        let outcome = Builder::new(&ledger()).build(&Value::Array(vec![raw]));
        assert_eq!(deepest(&outcome.forest), NESTING_LIMIT);
        assert!(matches!(
            outcome.warnings[..],
            [BuildWarning::DepthTruncated { dropped: 11, .. }]
        ));
    }

    #[test]
    fn flat_keeps_existing_nested_children() {
        let raw = json!([
            {"name": "Root", "code": "1", "children": [{"name": "Nested", "code": "9"}]},
            {"name": "Flat", "code": "2", "parent": "1"},
        ]);
        let forest = build_forest(&raw, &flat_fields());
        let kids: Vec<&str> = forest[0].children.iter().map(|n| n.display_name.as_str()).collect();
        assert_eq!(kids, vec!["Nested", "Flat"]);
    }

    #[test]
    fn builder_does_not_mutate_input() {
        let raw = json!([{"name": "A", "code": "2", "parent": "1"}, {"name": "B", "code": "1"}]);
        let before = raw.clone();
        let _ = build_forest(&raw, &flat_fields());
        assert_eq!(raw, before);
    }
}
