//! Message envelopes exchanged between a visualization host and its plugins.
//!
//! Every message on the wire has the shape `{ "type": <discriminant>, "data": <payload> }`.
//! The discriminant set is closed ([`Kind`] plus the `<Kind>Ready` readiness
//! signals) and each discriminant names a payload shape. Narrowing a wire
//! value is a decode into [`Envelope`] followed by a pattern match. Values
//! without a known discriminant are not envelopes; payloads that do not fit
//! their shape are still delivered, raw, as [`Envelope::Unshaped`].

pub mod envelope;
pub mod error;
pub mod graph;
pub mod kind;
pub mod ml;
pub mod payload;
pub mod schema_graph;
pub mod settings;

pub use envelope::{matches, matches_value, Envelope};
pub use error::{MessageError, Result};
pub use graph::{
    CompressedElement, DimensionType, Edge, ElementTypeAttributes, ElementTypeMetadata,
    GraphMetaData, GraphQueryResult, Node,
};
pub use kind::{Direction, Kind, READY_SUFFIX};
pub use ml::{
    CommunityDetection, LinkPredictionAttributes, LinkPredictionInstance, MLInstance, MLResult,
    MLResults, MlAlgorithm, ShortestPath,
};
pub use payload::{Payload, SettingsRequest};
pub use schema_graph::{
    SchemaAttribute, SchemaAttributeType, SchemaGraph, SchemaGraphEdge, SchemaGraphNode,
    SchemaGraphOptions, SchemaNode,
};
pub use settings::{MergePolicy, Settings};
