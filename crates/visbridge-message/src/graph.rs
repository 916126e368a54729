//! Graph query results pushed with `GraphData`.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The raw result of the host's current graph query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQueryResult {
    #[serde(default)]
    pub meta_data: GraphMetaData,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Whether the host is still querying the backend.
    #[serde(default)]
    pub querying_backend: bool,
}

impl GraphQueryResult {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Edges leaving the node `id`.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// A node, unique by `id` within its graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, deserialize_with = "element_id")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mldata: Option<Value>,
}

/// A directed edge between two node ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, deserialize_with = "element_id")]
    pub id: String,
    #[serde(default, deserialize_with = "element_id")]
    pub from: String,
    #[serde(default, deserialize_with = "element_id")]
    pub to: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Aggregate metadata for the nodes and edges of a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetaData {
    #[serde(default)]
    pub nodes: CompressedElement,
    #[serde(default)]
    pub edges: CompressedElement,
}

/// Metadata over either all nodes or all edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressedElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Per-label metadata.
    #[serde(default)]
    pub types: BTreeMap<String, ElementTypeMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTypeMetadata {
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_degree_in: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_degree_out: Option<f64>,
    #[serde(default)]
    pub attributes: BTreeMap<String, ElementTypeAttributes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTypeAttributes {
    pub dimension: DimensionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Value>,
}

/// How an attribute's values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    Categorical,
    Numerical,
    Temporal,
    Spatial,
    /// A dimension this crate does not know. Serializes as `"unknown"`.
    #[serde(other)]
    Unknown,
}

/// Element ids are strings, but backends that key by integer send numbers.
fn element_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(D::Error::custom(format!(
            "element id must be a string or a number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_full_result() {
        let result: GraphQueryResult = serde_json::from_value(json!({
            "metaData": {
                "nodes": {
                    "count": 2,
                    "labels": ["Person"],
                    "types": {
                        "Person": {
                            "count": 2,
                            "avgDegreeOut": 0.5,
                            "attributes": {
                                "age": {"dimension": "numerical", "statistics": {"min": 30}}
                            }
                        }
                    }
                },
                "edges": {"labels": ["KNOWS"], "types": {}}
            },
            "nodes": [
                {"id": "a", "label": "Person", "attributes": {"age": 30}},
                {"id": "b", "label": "Person", "attributes": {"age": 41}, "mldata": {"rank": 1}}
            ],
            "edges": [{"id": "e", "from": "a", "to": "b", "label": "KNOWS", "attributes": {}}],
            "queryingBackend": true
        }))
        .unwrap();

        assert!(result.querying_backend);
        assert_eq!(result.meta_data.nodes.count, Some(2));
        let person = &result.meta_data.nodes.types["Person"];
        assert_eq!(person.avg_degree_out, Some(0.5));
        assert_eq!(person.avg_degree_in, None);
        assert_eq!(
            person.attributes["age"].dimension,
            DimensionType::Numerical
        );
        assert_eq!(result.node("b").unwrap().mldata, Some(json!({"rank": 1})));
        assert_eq!(result.outgoing("a").count(), 1);
        assert_eq!(result.outgoing("b").count(), 0);
    }

    #[test]
    fn missing_sections_default() {
        let result: GraphQueryResult = serde_json::from_value(json!({})).unwrap();
        assert!(result.is_empty());
        assert!(!result.querying_backend);
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_options() {
        let value = serde_json::to_value(GraphQueryResult {
            nodes: vec![Node {
                id: "n".into(),
                ..Node::default()
            }],
            ..GraphQueryResult::default()
        })
        .unwrap();

        assert_eq!(value["queryingBackend"], json!(false));
        assert!(value["metaData"]["nodes"].get("count").is_none());
        assert!(value["nodes"][0].get("mldata").is_none());
    }

    #[test]
    fn unknown_dimension_is_kept_as_unknown() {
        let attributes: ElementTypeAttributes =
            serde_json::from_value(json!({"dimension": "ordinal", "values": ["low", "high"]}))
                .unwrap();
        assert_eq!(attributes.dimension, DimensionType::Unknown);
        assert_eq!(attributes.values.map(|values| values.len()), Some(2));
    }

    #[test]
    fn numeric_ids_read_as_strings() {
        let result: GraphQueryResult = serde_json::from_value(json!({
            "nodes": [{"id": 1}, {"id": 2.5}],
            "edges": [{"id": 10, "from": 1, "to": 2.5}]
        }))
        .unwrap();
        assert_eq!(result.nodes[0].id, "1");
        assert!(result.node("2.5").is_some());
        assert_eq!(result.outgoing("1").next().map(|edge| edge.to.as_str()), Some("2.5"));

        let err = serde_json::from_value::<Node>(json!({"id": [1]}));
        assert!(err.is_err());
    }

    #[test]
    fn type_metadata_count_defaults_to_zero() {
        let metadata: ElementTypeMetadata =
            serde_json::from_value(json!({"avgDegreeIn": 1.5})).unwrap();
        assert_eq!(metadata.count, 0);
        assert_eq!(metadata.avg_degree_in, Some(1.5));
    }
}
