use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use visbridge_message::{Envelope, Settings};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EnvelopeOutput<'a> {
    event: &'static str,
    discriminant: String,
    data: Value,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Serialize)]
struct SettingsOutput<'a> {
    event: &'static str,
    revision: u64,
    settings: &'a Settings,
    timestamp: String,
}

/// Outcome of validating one payload file.
#[derive(Serialize)]
pub struct ValidationReport {
    pub kind: String,
    pub file: String,
    pub valid: bool,
    pub error: Option<String>,
}

pub fn print_envelope(envelope: &Envelope, source: Option<&str>, format: OutputFormat) {
    let data = envelope
        .to_value()
        .ok()
        .and_then(|mut value| value.get_mut("data").map(Value::take))
        .unwrap_or(Value::Null);
    let discriminant = envelope.discriminant();

    match format {
        OutputFormat::Json => {
            let out = EnvelopeOutput {
                event: "envelope",
                discriminant,
                data,
                timestamp: now_unix_seconds(),
                source,
            };
            print_json_line(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["TYPE", "SIZE", "DATA"]);
            table.add_row(vec![
                discriminant,
                encoded_size(&data).to_string(),
                preview(&data),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("type={discriminant} size={} data={}", encoded_size(&data), preview(&data));
        }
    }
}

pub fn print_settings(revision: u64, settings: &Settings, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SettingsOutput {
                event: "settings",
                revision,
                settings,
                timestamp: now_unix_seconds(),
            };
            print_json_line(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["KEY", "VALUE"]);
            for (key, value) in settings.iter() {
                table.add_row(vec![key.clone(), value.to_string()]);
            }
            println!("settings revision {revision}");
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let pairs = settings
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("revision={revision} {pairs}");
        }
    }
}

pub fn print_validation(report: &ValidationReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json_line(report),
        OutputFormat::Table => {
            let mut table = new_table(vec!["KIND", "FILE", "VALID", "ERROR"]);
            table.add_row(vec![
                report.kind.clone(),
                report.file.clone(),
                report.valid.to_string(),
                report.error.clone().unwrap_or_default(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match &report.error {
            None => println!("{}: valid {}", report.file, report.kind),
            Some(error) => println!("{}: invalid {}: {error}", report.file, report.kind),
        },
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json_line<T: Serialize>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

fn encoded_size(data: &Value) -> usize {
    if data.is_null() {
        return 0;
    }
    serde_json::to_vec(data).map(|bytes| bytes.len()).unwrap_or(0)
}

const PREVIEW_CHARS: usize = 120;

fn preview(data: &Value) -> String {
    if data.is_null() {
        return String::new();
    }
    let text = data.to_string();
    if text.chars().count() <= PREVIEW_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
