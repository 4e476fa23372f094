// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Normalization of Lighthouse finding items
//!
//! Items are copied shallowly. Only `node` and `subItems.items[].relatedNode`
//! are rewritten, into fixed-key projections where every key is present and
//! missing values become `""`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reduced view of the element a finding points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub selector: String,
    pub snippet: String,
    pub explanation: String,
    pub node_label: String,
}

/// Reduced view of an element related to a sub-item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedNodeSummary {
    pub selector: String,
    pub snippet: String,
    pub node_label: String,
}

/// A finding item after normalization.
///
/// Decoding runs the item through normalization again. Normalizing is
/// idempotent, so a serialized finding reads back unchanged, including
/// pass-through `subItems` and null `node` values left in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct NormalizedFinding {
    /// Every other field of the source item, untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeSummary>,
    #[serde(rename = "subItems", skip_serializing_if = "Option::is_none")]
    pub sub_items: Option<NormalizedSubItems>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSubItems {
    pub items: Vec<NormalizedSubItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct NormalizedSubItem {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "relatedNode", skip_serializing_if = "Option::is_none")]
    pub related_node: Option<RelatedNodeSummary>,
}

impl From<Value> for NormalizedFinding {
    fn from(item: Value) -> Self {
        normalize_finding(&item)
    }
}

impl From<Value> for NormalizedSubItem {
    fn from(item: Value) -> Self {
        normalize_sub_item(&item)
    }
}

impl NodeSummary {
    pub fn project(node: &Value) -> Self {
        Self {
            selector: string_field(node, "selector"),
            snippet: string_field(node, "snippet"),
            explanation: string_field(node, "explanation"),
            node_label: string_field(node, "nodeLabel"),
        }
    }
}

impl RelatedNodeSummary {
    pub fn project(node: &Value) -> Self {
        Self {
            selector: string_field(node, "selector"),
            snippet: string_field(node, "snippet"),
            node_label: string_field(node, "nodeLabel"),
        }
    }
}

/// Normalize one `details.items` entry
pub fn normalize_finding(item: &Value) -> NormalizedFinding {
    let mut fields = shallow_copy(item);

    let node = take_present(&mut fields, "node").map(|n| NodeSummary::project(&n));

    let has_sub_item_list = fields
        .get("subItems")
        .and_then(|s| s.get("items"))
        .map_or(false, Value::is_array);

    let sub_items = if has_sub_item_list {
        fields.remove("subItems").map(|sub| {
            let items = sub
                .get("items")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(normalize_sub_item).collect())
                .unwrap_or_default();
            NormalizedSubItems { items }
        })
    } else {
        None
    };

    NormalizedFinding {
        fields,
        node,
        sub_items,
    }
}

fn normalize_sub_item(item: &Value) -> NormalizedSubItem {
    let mut fields = shallow_copy(item);
    let related_node =
        take_present(&mut fields, "relatedNode").map(|n| RelatedNodeSummary::project(&n));

    NormalizedSubItem {
        fields,
        related_node,
    }
}

/// Non-object items contribute no fields
fn shallow_copy(item: &Value) -> Map<String, Value> {
    item.as_object().cloned().unwrap_or_default()
}

/// Remove `key` unless it is absent or null; a null stays in the copy
fn take_present(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match fields.get(key) {
        None | Some(Value::Null) => None,
        Some(_) => fields.remove(key),
    }
}

fn string_field(node: &Value, key: &str) -> String {
    node.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
