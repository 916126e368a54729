use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};
use visbridge_channel::{
    AuthorityConfig, Channel, ChannelConfig, ChannelError, HostListener, ReadyGate,
    SettingsAuthority,
};
use visbridge_frame::FrameConfig;
use visbridge_message::{Envelope, Kind, Settings};
use visbridge_schema::SchemaRegistry;

use crate::cmd::{decode_payload, install_ctrlc_handler, read_json_file, HostArgs, POLL_INTERVAL};
use crate::exit::{channel_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_settings, OutputFormat};

pub fn run(args: HostArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = match &args.validate {
        Some(dir) => Some(Arc::new(
            SchemaRegistry::from_directory(dir)
                .map_err(|err| schema_error("schema load failed", err))?,
        )),
        None => None,
    };
    let staged = stage_payloads(&args, registry.as_deref())?;
    let initial = match &args.settings {
        Some(path) => read_settings(path, registry.as_deref())?,
        None => Settings::new(),
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let listener = HostListener::bind(&args.path)
        .map_err(|err| channel_error("bind failed", err))?
        .with_frame_config(FrameConfig {
            read_timeout: Some(POLL_INTERVAL),
            ..FrameConfig::default()
        });
    let window = Rc::new(
        listener
            .accept()
            .map_err(|err| channel_error("accept failed", err))?,
    );
    let channel = Channel::with_config(window.clone(), ChannelConfig::host());

    let gate = ReadyGate::attach(&channel);
    for envelope in staged {
        gate.publish(envelope);
    }
    if args.settings.is_some() {
        gate.publish(Envelope::Settings(initial.clone()));
    }

    let config = AuthorityConfig {
        policy: args.merge,
        ..AuthorityConfig::default()
    };
    let mut authority = SettingsAuthority::attach_with_config(&channel, initial, config);
    if let Some(registry) = registry {
        authority = authority.with_registry(registry);
    }

    let accepted = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&accepted);
    authority.on_change(move |merged| {
        counter.set(counter.get() + 1);
        print_settings(counter.get(), merged, format);
    });

    while running.load(Ordering::SeqCst) {
        match window.pump() {
            Ok(()) => {}
            Err(err) if err.is_timeout() => continue,
            Err(ChannelError::Disconnected(_)) => {
                info!("plugin disconnected");
                break;
            }
            Err(err) => return Err(channel_error("receive failed", err)),
        }

        if args.count.is_some_and(|count| accepted.get() >= count) {
            break;
        }
    }

    let undelivered = gate.staged();
    if !undelivered.is_empty() {
        warn!(kinds = ?undelivered, "plugin never announced readiness for staged data");
    }
    info!(
        accepted = accepted.get(),
        rejected = authority.rejected(),
        delivered = gate.delivered(),
        "host session finished"
    );
    Ok(SUCCESS)
}

fn stage_payloads(args: &HostArgs, registry: Option<&SchemaRegistry>) -> CliResult<Vec<Envelope>> {
    let files = [
        (Kind::GraphData, &args.graph),
        (Kind::MLData, &args.ml),
        (Kind::Schema, &args.schema),
    ];

    let mut staged = Vec::new();
    for (kind, path) in files {
        let Some(path) = path else {
            continue;
        };
        let data = read_json_file(path)?;
        if let Some(registry) = registry {
            registry
                .validate(kind, &data)
                .map_err(|err| schema_error(&path.display().to_string(), err))?;
        }
        staged.push(decode_payload(kind, data).map_err(|err| with_path(path, err))?);
    }
    Ok(staged)
}

fn read_settings(path: &Path, registry: Option<&SchemaRegistry>) -> CliResult<Settings> {
    let data = read_json_file(path)?;
    if let Some(registry) = registry {
        registry
            .validate(Kind::Settings, &data)
            .map_err(|err| schema_error(&path.display().to_string(), err))?;
    }
    Settings::from_value(data)
        .map_err(|err| CliError::new(DATA_INVALID, format!("{}: {err}", path.display())))
}

fn with_path(path: &Path, err: CliError) -> CliError {
    CliError::new(err.code, format!("{}: {}", path.display(), err.message))
}
