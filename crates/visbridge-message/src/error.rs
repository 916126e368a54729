/// Errors from parsing discriminants and policies supplied as text.
///
/// Decoding wire values never fails loudly; see [`Envelope::from_value`](crate::Envelope::from_value).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    /// The string is not one of the closed set of discriminants.
    #[error("unknown message kind '{0}'")]
    UnknownKind(String),

    /// The string is not a settings merge policy.
    #[error("unknown merge policy '{0}' (expected 'merge' or 'replace')")]
    UnknownMergePolicy(String),

    /// A settings value was not a JSON object.
    #[error("settings must be a JSON object, got {0}")]
    SettingsNotObject(&'static str),
}

pub type Result<T> = std::result::Result<T, MessageError>;
