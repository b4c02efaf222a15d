//! avro-json-decode - decode a JSON document against an Avro schema.
//!
//! Prints the decoded value as pretty JSON on stdout, or the decode error on
//! stderr with a non-zero exit status.

use avro_json_decoder::{Config, JsonDecoder, Schema};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "avro-json-decode", version, about)]
struct Cli {
    /// Avro schema file (JSON).
    #[arg(short, long)]
    schema: PathBuf,

    /// JSON input file, or `-` for stdin.
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Decoder config file (JSON).
    #[arg(long, env = "AVRO_JSON_CONFIG")]
    config: Option<PathBuf>,

    /// Fail on union values that more than one member accepts.
    #[arg(long)]
    strict_unions: bool,

    /// Require standard JSON syntax (no comments, single quotes, bare keys).
    #[arg(long)]
    strict_syntax: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> avro_json_decoder::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if cli.strict_unions {
        config.decoder.strict_unions = true;
    }
    if cli.strict_syntax {
        config.decoder.lenient_syntax = false;
    }

    avro_json_decoder::observability::init_tracing_with(&config.observability);

    let schema = Schema::parse_str(&std::fs::read_to_string(&cli.schema)?)?;
    let input = if cli.input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(&cli.input)?
    };

    tracing::info!(schema = %cli.schema.display(), input = %cli.input, "decoding");

    let decoder = JsonDecoder::new(config.decoder)?;
    let value = decoder.decode_str(&input, &schema, false)?;
    println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    Ok(())
}
