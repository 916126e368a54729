//! The closed set of message discriminants.

use std::fmt;
use std::str::FromStr;

use crate::error::MessageError;

/// Suffix appended to a discriminant to form its readiness signal.
pub const READY_SUFFIX: &str = "Ready";

/// A message discriminant.
///
/// Adding a kind is a protocol change: both host and plugin must be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// Result of the host's current graph query.
    GraphData,
    /// Machine-learning results keyed by algorithm.
    MLData,
    /// Serialized schema graph of the selected database.
    Schema,
    /// Plugin-defined key/value configuration.
    Settings,
    /// Host asking the plugin to resend its settings.
    SettingsRequest,
}

/// Which side produces messages of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HostToPlugin,
    PluginToHost,
    Bidirectional,
}

impl Kind {
    /// Every discriminant, in wire-table order.
    pub const ALL: [Kind; 5] = [
        Kind::GraphData,
        Kind::MLData,
        Kind::Schema,
        Kind::Settings,
        Kind::SettingsRequest,
    ];

    /// The discriminant string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::GraphData => "GraphData",
            Kind::MLData => "MLData",
            Kind::Schema => "Schema",
            Kind::Settings => "Settings",
            Kind::SettingsRequest => "SettingsRequest",
        }
    }

    /// Exact, case-sensitive lookup of a wire discriminant.
    pub fn parse(discriminant: &str) -> Option<Kind> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == discriminant)
    }

    /// The readiness discriminant for this kind, e.g. `GraphDataReady`.
    pub fn ready_discriminant(self) -> String {
        format!("{}{READY_SUFFIX}", self.as_str())
    }

    /// Parse a readiness discriminant back into the kind it announces.
    pub fn parse_ready(discriminant: &str) -> Option<Kind> {
        discriminant
            .strip_suffix(READY_SUFFIX)
            .and_then(Kind::parse)
    }

    /// Which side sends payloads of this kind.
    pub fn direction(self) -> Direction {
        match self {
            Kind::GraphData | Kind::MLData | Kind::Schema | Kind::SettingsRequest => {
                Direction::HostToPlugin
            }
            Kind::Settings => Direction::Bidirectional,
        }
    }

    /// Case-insensitive lookup for human input (CLI flags, file names).
    pub fn parse_loose(input: &str) -> Option<Kind> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(input.trim()))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::parse_loose(s).ok_or_else(|| MessageError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_exact() {
        let names: Vec<&str> = Kind::ALL.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(
            names,
            vec!["GraphData", "MLData", "Schema", "Settings", "SettingsRequest"]
        );
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(Kind::parse("GraphData"), Some(Kind::GraphData));
        assert_eq!(Kind::parse("graphdata"), None);
        assert_eq!(Kind::parse("Graph"), None);
        assert_eq!(Kind::parse(""), None);
    }

    #[test]
    fn ready_discriminants_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::parse_ready(&kind.ready_discriminant()), Some(kind));
        }
        assert_eq!(Kind::SettingsRequest.ready_discriminant(), "SettingsRequestReady");
        assert_eq!(Kind::parse_ready("Settings"), None);
        assert_eq!(Kind::parse_ready("FooReady"), None);
        assert_eq!(Kind::parse_ready("Ready"), None);
    }

    #[test]
    fn from_str_accepts_any_case() {
        assert_eq!("mldata".parse::<Kind>(), Ok(Kind::MLData));
        assert_eq!(" Schema ".parse::<Kind>(), Ok(Kind::Schema));
        assert_eq!(
            "Layout".parse::<Kind>(),
            Err(MessageError::UnknownKind("Layout".to_string()))
        );
    }

    #[test]
    fn only_settings_flows_both_ways() {
        assert_eq!(Kind::Settings.direction(), Direction::Bidirectional);
        assert_eq!(Kind::GraphData.direction(), Direction::HostToPlugin);
        assert_eq!(Kind::SettingsRequest.direction(), Direction::HostToPlugin);
    }
}
