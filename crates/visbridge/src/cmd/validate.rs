use visbridge_schema::{RegistryConfig, SchemaRegistry};

use crate::cmd::{decode_payload, read_json_file, ValidateArgs};
use crate::exit::{schema_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_validation, OutputFormat, ValidationReport};

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let config = RegistryConfig::default().with_fail_on_missing_schema(true);
    let registry = SchemaRegistry::from_directory_with_config(&args.schemas, config)
        .map_err(|err| schema_error("schema load failed", err))?;

    let data = read_json_file(&args.file)?;
    let error = match registry.validate(args.kind, &data) {
        Err(err) => Some(err.to_string()),
        Ok(()) => decode_payload(args.kind, data).err().map(|err| err.message),
    };

    let report = ValidationReport {
        kind: args.kind.to_string(),
        file: args.file.display().to_string(),
        valid: error.is_none(),
        error,
    };
    print_validation(&report, format);

    Ok(if report.valid { SUCCESS } else { DATA_INVALID })
}
