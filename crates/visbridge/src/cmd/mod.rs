use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use serde_json::{json, Value};
use visbridge_message::{Envelope, Kind, MergePolicy};

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, INTERNAL};
use crate::output::OutputFormat;

pub mod host;
pub mod send;
pub mod validate;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Act as the host: accept one plugin, deliver data, track its settings.
    Host(HostArgs),
    /// Act as a plugin: subscribe to kinds and print what arrives.
    Watch(WatchArgs),
    /// Act as a plugin: send one partial settings update.
    Send(SendArgs),
    /// Validate a payload file against a schema directory.
    Validate(ValidateArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Host(args) => host::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Send(args) => send::run(args),
        Command::Validate(args) => validate::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct HostArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// GraphData payload delivered once the plugin announces GraphDataReady.
    #[arg(long, value_name = "FILE")]
    pub graph: Option<PathBuf>,
    /// MLData payload delivered once the plugin announces MLDataReady.
    #[arg(long, value_name = "FILE")]
    pub ml: Option<PathBuf>,
    /// Schema payload delivered once the plugin announces SchemaReady.
    #[arg(long, value_name = "FILE")]
    pub schema: Option<PathBuf>,
    /// Initial settings, delivered once the plugin announces SettingsReady.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
    /// How inbound settings combine with the held value.
    #[arg(long, value_name = "POLICY", default_value = "merge")]
    pub merge: MergePolicy,
    /// Schema directory; staged payloads and merged settings must validate.
    #[arg(long, value_name = "DIR")]
    pub validate: Option<PathBuf>,
    /// Exit after N accepted settings updates.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Host socket path to connect to.
    pub path: PathBuf,
    /// Kinds to subscribe to (comma-separated). Default: all.
    #[arg(long, value_delimiter = ',')]
    pub kinds: Vec<Kind>,
    /// Exit after receiving N envelopes.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Host socket path to connect to.
    pub path: PathBuf,
    /// Partial settings object.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the partial settings object from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory of `<kind>.schema.json` files.
    #[arg(long, value_name = "DIR")]
    pub schemas: PathBuf,
    /// Payload kind the file holds.
    #[arg(long)]
    pub kind: Kind,
    /// Payload file.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// How long a blocking read waits before the loop rechecks for Ctrl-C.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub(crate) fn read_json_file(path: &Path) -> CliResult<Value> {
    let bytes = std::fs::read(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("{} is not valid JSON: {err}", path.display()),
        )
    })
}

/// Wrap `data` as a `kind` envelope, checking it has that kind's payload shape.
pub(crate) fn decode_payload(kind: Kind, data: Value) -> CliResult<Envelope> {
    match Envelope::from_value(&json!({ "type": kind.as_str(), "data": data })) {
        Some(envelope) if !envelope.is_unshaped() => Ok(envelope),
        _ => Err(CliError::new(
            DATA_INVALID,
            format!("payload does not have the {kind} shape"),
        )),
    }
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_payload_checks_shape() {
        let envelope = decode_payload(Kind::Settings, json!({"zoom": 2})).unwrap();
        assert_eq!(envelope.kind(), Some(Kind::Settings));

        let err = decode_payload(Kind::Settings, json!([1, 2])).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("Settings"));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let path = std::env::temp_dir().join("visbridge-definitely-missing.json");
        let err = read_json_file(&path).unwrap_err();
        assert!(err.message.contains("visbridge-definitely-missing.json"));
    }
}
