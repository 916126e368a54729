use tracing::info;
use visbridge_channel::connect;
use visbridge_message::{Envelope, Settings};

use crate::cmd::{read_json_file, SendArgs};
use crate::exit::{channel_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let partial = resolve_settings(&args)?;
    let keys = partial.len();

    let window = connect(&args.path).map_err(|err| channel_error("connect failed", err))?;
    window
        .try_send(&Envelope::Settings(partial))
        .map_err(|err| channel_error("send failed", err))?;

    info!(keys, "settings update sent");
    Ok(SUCCESS)
}

fn resolve_settings(args: &SendArgs) -> CliResult<Settings> {
    let value = match (&args.json, &args.file) {
        (Some(json), _) => serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?,
        (None, Some(path)) => read_json_file(path)?,
        (None, None) => return Err(CliError::new(USAGE, "one of --json or --file is required")),
    };
    Settings::from_value(value).map_err(|err| CliError::new(DATA_INVALID, err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn args(json: Option<&str>) -> SendArgs {
        SendArgs {
            path: PathBuf::from("/tmp/unused.sock"),
            json: json.map(str::to_string),
            file: None,
        }
    }

    #[test]
    fn settings_must_be_an_object() {
        assert_eq!(resolve_settings(&args(Some("42"))).unwrap_err().code, DATA_INVALID);
        assert_eq!(resolve_settings(&args(Some("{oops"))).unwrap_err().code, USAGE);
        assert_eq!(resolve_settings(&args(None)).unwrap_err().code, USAGE);

        let settings = resolve_settings(&args(Some(r#"{"zoom": 2}"#))).unwrap();
        assert_eq!(settings.len(), 1);
    }
}
