//! Document loading functionality.
//!
//! This module provides functions to load documents from files or stdin and
//! turn them into `Node` trees that jsonhand can query. JSON, JSON Lines and
//! YAML are understood, optionally gzip-compressed.

use crate::document::node::Node;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Input formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    JsonLines,
    Yaml,
}

/// Loads and parses a document from the filesystem.
///
/// The format is chosen from the file name: `.jsonl`/`.ndjson` are read as
/// JSON Lines, `.yaml`/`.yml` as YAML, and everything else as JSON. A trailing
/// `.gz` is decompressed first and ignored when choosing the format.
///
/// # Examples
///
/// ```no_run
/// use jsonhand::file::loader::load_file;
///
/// let tree = load_file("data.json").unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist or cannot be read
/// - The file is gzipped but corrupted
/// - The file contents do not parse in the detected format
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Node> {
    let path_ref = path.as_ref();

    let is_gzipped = path_ref
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        read_gzipped_file(path_ref)?
    } else {
        fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read file {}", path_ref.display()))?
    };

    parse_content(&content, determine_format(path_ref))
}

/// Loads and parses a document from standard input.
///
/// Gzip input is detected by its magic bytes. The content is tried as JSON,
/// then as JSON Lines, then as YAML.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or matches none of the formats.
pub fn load_from_stdin() -> Result<Node> {
    use std::io::{self, Read};

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in stdin")?
    };

    if let Ok(node) = parse_json(&content) {
        return Ok(node);
    }
    if let Ok(node) = parse_jsonl_content(&content) {
        return Ok(node);
    }
    parse_yaml(&content).context("Failed to parse stdin: input is neither JSON, JSONL nor YAML")
}

/// Parses content in the given format.
pub fn parse_content(content: &str, format: Format) -> Result<Node> {
    match format {
        Format::Json => parse_json(content).context("Failed to parse JSON"),
        Format::JsonLines => parse_jsonl_content(content),
        Format::Yaml => parse_yaml(content).context("Failed to parse YAML"),
    }
}

/// Parses a JSON document.
///
/// Blank input is accepted and yields an empty mapping, which every query
/// reports as no match.
pub fn parse_json(content: &str) -> Result<Node> {
    if content.trim().is_empty() {
        return Ok(Node::Object(Default::default()));
    }
    Ok(serde_json::from_str(content)?)
}

/// Parses a YAML document. Blank input yields an empty mapping.
pub fn parse_yaml(content: &str) -> Result<Node> {
    if content.trim().is_empty() {
        return Ok(Node::Object(Default::default()));
    }
    Ok(serde_yaml::from_str(content)?)
}

/// Parses JSONL content (newline-delimited JSON) into a sequence.
///
/// Each line must be a valid JSON value. Blank lines are skipped.
pub fn parse_jsonl_content(content: &str) -> Result<Node> {
    let mut lines = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let node: Node = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", line_num + 1))?;
        lines.push(node);
    }

    if lines.is_empty() {
        anyhow::bail!("No valid JSON found in JSONL content");
    }

    Ok(Node::Array(lines))
}

/// Returns true if `text` parses as a JSON document.
///
/// # Example
///
/// ```
/// use jsonhand::file::loader::is_json;
///
/// assert!(is_json(r#"{"key1": "value"}"#));
/// assert!(!is_json("1235678abc"));
/// ```
pub fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}

/// Determines the document format from a file name.
///
/// Examples:
/// - `data.jsonl` → JSON Lines
/// - `data.yaml.gz` → YAML
/// - `data.json.gz` → JSON
pub fn determine_format<P: AsRef<Path>>(path: P) -> Format {
    let path_str = path.as_ref().to_string_lossy();

    let base = path_str.strip_suffix(".gz").unwrap_or(&path_str);

    if base.ends_with(".jsonl") || base.ends_with(".ndjson") {
        Format::JsonLines
    } else if base.ends_with(".yaml") || base.ends_with(".yml") {
        Format::Yaml
    } else {
        Format::Json
    }
}

/// Reads and decompresses a gzipped file.
fn read_gzipped_file<P: AsRef<Path>>(path: P) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = fs::File::open(path).context("Failed to open gzipped file")?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

/// Decompresses gzip-encoded bytes to a UTF-8 string.
fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped stdin")?;
    Ok(content)
}
