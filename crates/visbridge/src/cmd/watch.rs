use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;
use visbridge_channel::{connect_with_config, Channel, ChannelConfig, ChannelError, SubscriptionGuard};
use visbridge_frame::FrameConfig;
use visbridge_message::Kind;

use crate::cmd::{install_ctrlc_handler, WatchArgs, POLL_INTERVAL};
use crate::exit::{channel_error, CliResult, SUCCESS};
use crate::output::{print_envelope, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let kinds = selected_kinds(&args.kinds);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let config = FrameConfig {
        read_timeout: Some(POLL_INTERVAL),
        ..FrameConfig::default()
    };
    let window = Rc::new(
        connect_with_config(&args.path, config)
            .map_err(|err| channel_error("connect failed", err))?,
    );
    let channel = Channel::with_config(window.clone(), ChannelConfig::default().with_label("watch"));

    let received = Rc::new(Cell::new(0u64));
    let _subscriptions: Vec<SubscriptionGuard> = kinds
        .iter()
        .map(|&kind| {
            let counter = Rc::clone(&received);
            channel
                .subscribe_kind(kind, move |envelope| {
                    counter.set(counter.get() + 1);
                    print_envelope(&envelope, Some("host"), format);
                })
                .into_guard()
        })
        .collect();
    info!(kinds = ?kinds, "watching");

    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| received.get() >= count) {
            break;
        }
        match window.pump() {
            Ok(()) => {}
            Err(err) if err.is_timeout() => {}
            Err(ChannelError::Disconnected(_)) => {
                info!("host disconnected");
                break;
            }
            Err(err) => return Err(channel_error("receive failed", err)),
        }
    }

    Ok(SUCCESS)
}

/// Requested kinds without duplicates, or every kind when none were named.
fn selected_kinds(requested: &[Kind]) -> Vec<Kind> {
    if requested.is_empty() {
        return Kind::ALL.to_vec();
    }
    let mut kinds = Vec::with_capacity(requested.len());
    for kind in requested {
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    kinds
}
