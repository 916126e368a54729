//! Machine-learning results pushed with `MLData`.
//!
//! The payload is an object keyed by algorithm. Known algorithms have typed
//! views; every key, known or not, is kept verbatim so that hosts newer than
//! the plugin do not lose data in transit.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Algorithm keys with a typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MlAlgorithm {
    Centrality,
    LinkPrediction,
    CommunityDetection,
    ShortestPath,
}

impl MlAlgorithm {
    pub const ALL: [MlAlgorithm; 4] = [
        MlAlgorithm::Centrality,
        MlAlgorithm::LinkPrediction,
        MlAlgorithm::CommunityDetection,
        MlAlgorithm::ShortestPath,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MlAlgorithm::Centrality => "centrality",
            MlAlgorithm::LinkPrediction => "linkPrediction",
            MlAlgorithm::CommunityDetection => "communityDetection",
            MlAlgorithm::ShortestPath => "shortestPath",
        }
    }
}

/// All machine-learning results, keyed by algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MLResults(BTreeMap<String, Value>);

impl MLResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw result for any key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Node id to centrality score.
    pub fn centrality(&self) -> Option<MLInstance<BTreeMap<String, f64>>> {
        self.view(MlAlgorithm::Centrality.key())
    }

    pub fn link_prediction(&self) -> Option<MLInstance<Vec<LinkPredictionInstance>>> {
        self.view(MlAlgorithm::LinkPrediction.key())
    }

    pub fn community_detection(&self) -> Option<CommunityDetection> {
        self.view(MlAlgorithm::CommunityDetection.key())
    }

    pub fn shortest_path(&self) -> Option<ShortestPath> {
        self.view(MlAlgorithm::ShortestPath.key())
    }

    /// Results in the list form `{ "results": [{protocol, value, label}] }`.
    pub fn results(&self) -> Option<Vec<MLResult>> {
        self.view("results")
    }

    /// `None` when the key is absent or its value does not fit `T`.
    fn view<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.0.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(view) => Some(view),
            Err(err) => {
                tracing::trace!(key, error = %err, "ml result does not fit typed view");
                None
            }
        }
    }
}

impl From<BTreeMap<String, Value>> for MLResults {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// One algorithm's output and whether it is switched on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MLInstance<T> {
    pub enabled: bool,
    pub result: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPredictionInstance {
    pub attributes: LinkPredictionAttributes,
    pub from: String,
    pub to: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPredictionAttributes {
    pub jaccard_coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityDetection {
    pub enabled: bool,
    /// Communities as lists of node ids.
    pub result: Vec<Vec<String>>,
    pub jaccard_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortestPath {
    pub enabled: bool,
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trt_node: Option<String>,
}

/// One entry of the list form; `value` is shaped by `protocol`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MLResult {
    pub protocol: String,
    pub value: Value,
    #[serde(default)]
    pub label: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> MLResults {
        serde_json::from_value(json!({
            "centrality": {"enabled": true, "result": {"a": 0.25, "b": 0.75}},
            "linkPrediction": {
                "enabled": false,
                "result": [{"attributes": {"jaccard_coefficient": 0.5}, "from": "a", "to": "b", "id": "ab"}]
            },
            "communityDetection": {"enabled": true, "result": [["a", "b"], ["c"]], "jaccard_threshold": 0.3},
            "shortestPath": {"enabled": true, "result": ["a", "b"], "srcNode": "a", "trtNode": "b"},
            "clustering": {"experimental": true}
        }))
        .unwrap()
    }

    #[test]
    fn typed_views() {
        let ml = sample();
        assert_eq!(ml.centrality().unwrap().result["b"], 0.75);
        assert!(!ml.link_prediction().unwrap().enabled);
        assert_eq!(
            ml.link_prediction().unwrap().result[0].attributes.jaccard_coefficient,
            0.5
        );
        assert_eq!(ml.community_detection().unwrap().result.len(), 2);
        assert_eq!(ml.shortest_path().unwrap().src_node.as_deref(), Some("a"));
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let ml = sample();
        assert_eq!(ml.get("clustering"), Some(&json!({"experimental": true})));

        let back: MLResults = serde_json::from_value(serde_json::to_value(&ml).unwrap()).unwrap();
        assert_eq!(back, ml);
        assert_eq!(back.len(), 5);
    }

    #[test]
    fn mismatched_view_is_none() {
        let mut ml = MLResults::new();
        ml.insert("centrality", json!({"enabled": "yes"}));
        assert!(ml.centrality().is_none());
        assert!(ml.shortest_path().is_none());
    }

    #[test]
    fn list_form_results() {
        let ml: MLResults = serde_json::from_value(json!({
            "results": [{"protocol": "centrality/v1", "value": {"a": 1}, "label": "pagerank"}]
        }))
        .unwrap();
        let results = ml.results().unwrap();
        assert_eq!(results[0].protocol, "centrality/v1");
        assert_eq!(results[0].label, "pagerank");
    }

    #[test]
    fn algorithm_keys() {
        let keys: Vec<&str> = MlAlgorithm::ALL.iter().map(|alg| alg.key()).collect();
        assert_eq!(
            keys,
            vec!["centrality", "linkPrediction", "communityDetection", "shortestPath"]
        );
    }
}
