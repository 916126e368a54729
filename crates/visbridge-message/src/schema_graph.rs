//! Database schema pushed with `Schema`, in serialized-graph form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::DimensionType;

/// A serialized schema graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SchemaGraphOptions>,
    #[serde(default)]
    pub nodes: Vec<SchemaGraphNode>,
    #[serde(default)]
    pub edges: Vec<SchemaGraphEdge>,
}

impl SchemaGraph {
    /// Find the schema node whose entity name is `name`.
    pub fn entity(&self, name: &str) -> Option<&SchemaNode> {
        self.nodes
            .iter()
            .filter_map(|node| node.attributes.as_ref())
            .find(|schema| schema.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaGraphOptions {
    /// `directed`, `undirected` or `mixed`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub graph_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_self_loops: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraphNode {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<SchemaNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraphEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undirected: Option<bool>,
}

/// One entity of the database schema.
///
/// Graph attributes other than the named fields are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<SchemaAttribute>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: SchemaAttributeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaAttributeType {
    Bool,
    Date,
    Datetime,
    Duration,
    Float,
    Int,
    String,
    Time,
    /// A type name this crate does not know. Serializes as `"unknown"`.
    #[serde(other)]
    Unknown,
}
