//! CLI: encode JSON documents to Borsh, decode Borsh to JSON, show types.
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, info, warn};

use borsh_schema::path_de::from_str_with_path;
use borsh_schema::projection::{Side, project};
use borsh_schema::{Decoder, Error, Schema, Value, encode, schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// encode and decode Borsh binary data against a borsh-js style JSON schema
#[derive(Parser, Debug)]
#[command(name = "borsh-schema", version)]
pub struct CommandLineInterface {
    /// more logging: -v info, -vv debug, -vvv trace (RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// encode each JSON value document, one hex line per document
    Encode(EncodeOut),
    /// decode Borsh bytes and print the value as JSON
    Decode(DecodeOut),
    /// print the schema and the value types it accepts and produces
    Types(TypesOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// JSON schema file (borsh-js vocabulary)
    #[arg(long, short)]
    schema: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /data/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct EncodeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// write the concatenated bytes instead of hex lines
    #[arg(long)]
    raw_bytes: bool,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// hex encoded input, optionally prefixed with 0x
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    hex: Option<String>,

    /// file holding the raw bytes
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// fail if bytes remain after the value
    #[arg(long)]
    exact: bool,

    /// leave numeric vectors as plain sequences
    #[arg(long)]
    no_typed_arrays: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct TypesOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// also print the schema normalized back to JSON
    #[arg(long)]
    json: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> Result<Schema> {
        let path = &self.schema;
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        let doc: serde_json::Value = from_str_with_path(&source)
            .with_context(|| format!("failed to parse schema file {}", path.display()))?;
        let schema = schema::json::from_json(&doc)
            .with_context(|| format!("invalid schema in {}", path.display()))?;
        debug!(schema = %schema, "loaded schema");
        Ok(schema)
    }
}

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&Path, serde_json::Value) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let json_value: serde_json::Value = from_str_with_path(&source)
                .with_context(|| format!("failed to parse JSON source file ({})", source_path.display()))?;
            let json_value = match self.json_pointer.as_deref() {
                None => json_value,
                Some(pointer) => json_value.pointer(pointer).cloned().with_context(|| {
                    format!("JSON pointer {pointer} selects nothing in {}", source_path.display())
                })?,
            };
            apply(&source_path, json_value)?;
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Encode(target) => {
                let schema = target.schema_settings.load()?;
                let mut raw = Vec::<u8>::new();
                let mut lines = Vec::<String>::new();
                target.input_settings.load_process(|source_path, json_value| {
                    let value = Value::from(json_value);
                    let bytes = encode(&schema, &value)
                        .with_context(|| format!("failed to encode {}", source_path.display()))?;
                    info!(source = %source_path.display(), bytes = bytes.len(), "encoded document");
                    if target.raw_bytes {
                        raw.extend_from_slice(&bytes);
                    } else {
                        lines.push(hex::encode(&bytes));
                    }
                    Ok(())
                })?;
                if target.raw_bytes {
                    write_output(target.out.as_deref(), &raw)
                } else {
                    let mut text = lines.join("\n");
                    text.push('\n');
                    write_output(target.out.as_deref(), text.as_bytes())
                }
            }
            Command::Decode(target) => {
                let schema = target.schema_settings.load()?;
                let bytes = match (&target.hex, &target.input) {
                    (Some(text), _) => parse_hex(text)?,
                    (None, Some(path)) => std::fs::read(path)
                        .with_context(|| format!("failed to read input file {}", path.display()))?,
                    (None, None) => bail!("one of --hex or --input is required"),
                };
                let mut decoder = Decoder::new(&bytes);
                let value = if target.no_typed_arrays {
                    decoder.decode_raw(&schema)
                } else {
                    decoder.decode(&schema)
                };
                let value = value.context("failed to decode input")?;
                if decoder.remaining() > 0 {
                    if target.exact {
                        let error = Error::TrailingBytes {
                            consumed: decoder.position(),
                            remaining: decoder.remaining(),
                        };
                        return Err(error).context("failed to decode input");
                    }
                    warn!(remaining = decoder.remaining(), "ignoring trailing bytes");
                }
                let mut text = serde_json::to_string_pretty(&value.to_json())?;
                text.push('\n');
                write_output(target.out.as_deref(), text.as_bytes())
            }
            Command::Types(target) => {
                let schema = target.schema_settings.load()?;
                println!("{} {schema}", "schema:".bold());
                println!("{} {}", "input: ".bold(), project(&schema, Side::Input));
                println!("{} {}", "output:".bold(), project(&schema, Side::Output));
                if target.json {
                    let doc = schema::json::to_json(&schema);
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, bytes).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = digits.strip_prefix("0x").unwrap_or(&digits);
    hex::decode(digits).context("invalid hex input")
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                matched_any = true;
                out.push(entry?);
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_tolerates_prefix_and_spaces() {
        assert_eq!(parse_hex("0x02 00 00 00 68 69").unwrap(), [2, 0, 0, 0, 0x68, 0x69]);
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn literal_paths_pass_through_unchanged() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
        assert!(resolve_file_path_patterns(["/nonexistent-borsh-dir/*.json"]).is_err());
    }

    #[test]
    fn decode_requires_a_byte_source() {
        let parsed = CommandLineInterface::try_parse_from(["borsh-schema", "decode", "--schema", "s.json"]);
        assert!(parsed.is_err());
        let parsed = CommandLineInterface::try_parse_from([
            "borsh-schema", "-vv", "decode", "--schema", "s.json", "--hex", "00",
        ]).unwrap();
        assert_eq!(parsed.verbose, 2);
    }
}
