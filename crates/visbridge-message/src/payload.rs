//! Typed narrowing from an [`Envelope`] to its payload.

use crate::envelope::Envelope;
use crate::graph::GraphQueryResult;
use crate::kind::Kind;
use crate::ml::MLResults;
use crate::schema_graph::SchemaGraph;
use crate::settings::Settings;

/// A payload type bound to exactly one discriminant.
pub trait Payload: Sized {
    /// The discriminant carrying this payload.
    const KIND: Kind;

    /// Extract the payload if `envelope` carries [`Self::KIND`].
    fn narrow(envelope: Envelope) -> Option<Self>;

    fn into_envelope(self) -> Envelope;
}

/// Marker payload for `SettingsRequest`, which carries no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsRequest;

macro_rules! impl_payload {
    ($ty:ty, $variant:ident) => {
        impl Payload for $ty {
            const KIND: Kind = Kind::$variant;

            fn narrow(envelope: Envelope) -> Option<Self> {
                match envelope {
                    Envelope::$variant(payload) => Some(payload),
                    _ => None,
                }
            }

            fn into_envelope(self) -> Envelope {
                Envelope::$variant(self)
            }
        }
    };
}

impl_payload!(GraphQueryResult, GraphData);
impl_payload!(MLResults, MLData);
impl_payload!(SchemaGraph, Schema);
impl_payload!(Settings, Settings);

impl Payload for SettingsRequest {
    const KIND: Kind = Kind::SettingsRequest;

    fn narrow(envelope: Envelope) -> Option<Self> {
        match envelope {
            Envelope::SettingsRequest => Some(SettingsRequest),
            _ => None,
        }
    }

    fn into_envelope(self) -> Envelope {
        Envelope::SettingsRequest
    }
}
