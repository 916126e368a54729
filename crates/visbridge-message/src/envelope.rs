//! The tagged envelope and its wire form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::graph::GraphQueryResult;
use crate::kind::Kind;
use crate::ml::MLResults;
use crate::schema_graph::SchemaGraph;
use crate::settings::Settings;

/// Wire shape of every message: `{ "type": ..., "data": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
}

/// One decoded message.
///
/// The variant is the discriminant. Payloads are decoded into their typed
/// shape when they fit it; payloads that do not are carried as
/// [`Envelope::Unshaped`] so that nothing with a known discriminant is lost.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    GraphData(GraphQueryResult),
    MLData(MLResults),
    Schema(SchemaGraph),
    Settings(Settings),
    SettingsRequest,
    /// `<Kind>Ready`: a listener for `Kind` is attached on the sending side.
    Ready(Kind),
    /// A payload discriminant whose `data` does not have that kind's shape.
    ///
    /// Shapes are a sender contract and are not enforced on receipt; the raw
    /// `data` is kept as sent.
    Unshaped { kind: Kind, data: Value },
}

impl Envelope {
    /// The payload discriminant, or `None` for readiness signals.
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Envelope::GraphData(_) => Some(Kind::GraphData),
            Envelope::MLData(_) => Some(Kind::MLData),
            Envelope::Schema(_) => Some(Kind::Schema),
            Envelope::Settings(_) => Some(Kind::Settings),
            Envelope::SettingsRequest => Some(Kind::SettingsRequest),
            Envelope::Ready(_) => None,
            Envelope::Unshaped { kind, .. } => Some(*kind),
        }
    }

    /// True for payloads kept raw because they did not fit their kind's shape.
    pub fn is_unshaped(&self) -> bool {
        matches!(self, Envelope::Unshaped { .. })
    }

    /// The kind announced by a readiness signal.
    pub fn ready_kind(&self) -> Option<Kind> {
        match self {
            Envelope::Ready(kind) => Some(*kind),
            _ => None,
        }
    }

    /// The `type` string this envelope carries on the wire.
    pub fn discriminant(&self) -> String {
        match self {
            Envelope::Ready(kind) => kind.ready_discriminant(),
            other => other
                .kind()
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Decode a wire value.
    ///
    /// Returns `None` only when there is no known discriminant: a missing or
    /// non-string `type`, or an unknown one. A known payload discriminant
    /// always yields an envelope, [`Envelope::Unshaped`] if `data` does not
    /// fit the typed payload.
    pub fn from_value(value: &Value) -> Option<Envelope> {
        let discriminant = value.get("type")?.as_str()?;
        let data = value.get("data").cloned().unwrap_or(Value::Null);

        let Some(kind) = Kind::parse(discriminant) else {
            let ready = Kind::parse_ready(discriminant).map(Envelope::Ready);
            if ready.is_none() {
                trace!(discriminant, "ignoring unknown discriminant");
            }
            return ready;
        };

        let decoded = match kind {
            Kind::GraphData => serde_json::from_value(data.clone()).map(Envelope::GraphData),
            Kind::MLData => serde_json::from_value(data.clone()).map(Envelope::MLData),
            Kind::Schema => serde_json::from_value(data.clone()).map(Envelope::Schema),
            Kind::Settings => serde_json::from_value(data.clone()).map(Envelope::Settings),
            Kind::SettingsRequest => return Some(Envelope::SettingsRequest),
        };

        match decoded {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                debug!(discriminant, error = %err, "payload does not fit its discriminant; keeping it raw");
                Some(Envelope::Unshaped { kind, data })
            }
        }
    }

    /// Encode to the wire shape. Payload-less envelopes omit `data`.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        let data = match self {
            Envelope::GraphData(graph) => serde_json::to_value(graph)?,
            Envelope::MLData(ml) => serde_json::to_value(ml)?,
            Envelope::Schema(schema) => serde_json::to_value(schema)?,
            Envelope::Settings(settings) => serde_json::to_value(settings)?,
            Envelope::SettingsRequest | Envelope::Ready(_) => Value::Null,
            Envelope::Unshaped { data, .. } => data.clone(),
        };
        serde_json::to_value(WireMessage {
            kind: self.discriminant(),
            data,
        })
    }

    /// Decode straight from serialized JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Envelope> {
        let value: Value = serde_json::from_slice(bytes).ok()?;
        Envelope::from_value(&value)
    }
}

impl From<Settings> for Envelope {
    fn from(settings: Settings) -> Self {
        Envelope::Settings(settings)
    }
}

/// True iff `envelope` carries the payload discriminant `kind`.
///
/// Readiness signals match no payload kind.
pub fn matches(envelope: &Envelope, kind: Kind) -> bool {
    envelope.kind() == Some(kind)
}

/// The same predicate on an undecoded wire value.
///
/// A value without a string `type` matches nothing.
pub fn matches_value(value: &Value, discriminant: &str) -> bool {
    value.get("type").and_then(Value::as_str) == Some(discriminant)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn graph_wire() -> Value {
        json!({
            "type": "GraphData",
            "data": {
                "metaData": {
                    "nodes": {"count": 1, "labels": ["Person"], "types": {}},
                    "edges": {"labels": [], "types": {}}
                },
                "nodes": [{"id": "n1", "label": "Person", "attributes": {"name": "Ada"}}],
                "edges": [],
                "queryingBackend": false
            }
        })
    }

    #[test]
    fn graph_data_decodes_and_encodes() {
        let wire = graph_wire();
        let envelope = Envelope::from_value(&wire).unwrap();
        assert!(matches(&envelope, Kind::GraphData));

        let Envelope::GraphData(graph) = &envelope else {
            panic!("expected graph data, got {envelope:?}");
        };
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].attributes["name"], "Ada");

        let back = Envelope::from_value(&envelope.to_value().unwrap()).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn ready_signal_has_no_data() {
        let wire = Envelope::Ready(Kind::Settings).to_value().unwrap();
        assert_eq!(wire, json!({"type": "SettingsReady"}));
        assert_eq!(
            Envelope::from_value(&wire),
            Some(Envelope::Ready(Kind::Settings))
        );
    }

    #[test]
    fn settings_request_ignores_stray_data() {
        assert_eq!(
            Envelope::SettingsRequest.to_value().unwrap(),
            json!({"type": "SettingsRequest"})
        );
        assert_eq!(
            Envelope::from_value(&json!({"type": "SettingsRequest", "data": 5})),
            Some(Envelope::SettingsRequest)
        );
    }

    #[test]
    fn values_without_a_known_discriminant_are_not_envelopes() {
        let rejected = [
            json!(null),
            json!("GraphData"),
            json!({}),
            json!({"type": 7}),
            json!({"type": "Layout", "data": {}}),
            json!({"type": "graphdata", "data": {}}),
            json!({"type": "LayoutReady"}),
        ];
        for value in rejected {
            assert_eq!(Envelope::from_value(&value), None, "{value}");
        }
    }

    #[test]
    fn mismatched_payloads_are_kept_raw() {
        let cases = [
            (json!({"type": "Settings", "data": [1, 2]}), Kind::Settings, json!([1, 2])),
            (json!({"type": "Settings"}), Kind::Settings, Value::Null),
            (
                json!({"type": "GraphData", "data": {"nodes": "many"}}),
                Kind::GraphData,
                json!({"nodes": "many"}),
            ),
        ];
        for (wire, kind, data) in cases {
            let envelope = Envelope::from_value(&wire).unwrap();
            assert!(envelope.is_unshaped(), "{wire}");
            assert!(matches(&envelope, kind));
            assert_eq!(envelope, Envelope::Unshaped { kind, data });
            assert_eq!(envelope.to_value().unwrap(), wire);
        }
    }

    #[test]
    fn loosely_typed_graph_data_still_decodes() {
        let wire = json!({
            "type": "GraphData",
            "data": {
                "metaData": {
                    "nodes": {
                        "labels": ["Person"],
                        "types": {
                            "Person": {"attributes": {"mood": {"dimension": "ordinal"}}}
                        }
                    },
                    "edges": {"labels": [], "types": {}}
                },
                "nodes": [{"id": 1, "label": "Person", "attributes": {}}],
                "edges": [{"id": 7, "from": 1, "to": "1", "label": "self", "attributes": {}}]
            }
        });
        let Some(Envelope::GraphData(graph)) = Envelope::from_value(&wire) else {
            panic!("expected typed graph data");
        };
        assert_eq!(graph.nodes[0].id, "1");
        assert_eq!(graph.outgoing("1").count(), 1);
        assert_eq!(graph.meta_data.nodes.types["Person"].count, 0);
    }

    #[test]
    fn matches_only_its_own_kind() {
        let settings = Envelope::Settings(Settings::default());
        assert!(matches(&settings, Kind::Settings));
        assert!(!matches(&settings, Kind::SettingsRequest));
        assert!(!matches(&Envelope::Ready(Kind::Settings), Kind::Settings));
    }

    #[test]
    fn matches_value_requires_string_type() {
        assert!(matches_value(&json!({"type": "Schema"}), "Schema"));
        assert!(!matches_value(&json!({"type": "Schema"}), "schema"));
        assert!(!matches_value(&json!({"kind": "Schema"}), "Schema"));
        assert!(!matches_value(&json!([1]), "Schema"));
    }

    #[test]
    fn discriminant_strings() {
        assert_eq!(Envelope::Ready(Kind::MLData).discriminant(), "MLDataReady");
        assert_eq!(Envelope::SettingsRequest.discriminant(), "SettingsRequest");
    }

    #[test]
    fn from_slice_tolerates_garbage() {
        assert_eq!(Envelope::from_slice(b"not json"), None);
        assert_eq!(
            Envelope::from_slice(br#"{"type":"SchemaReady"}"#),
            Some(Envelope::Ready(Kind::Schema))
        );
    }
}
