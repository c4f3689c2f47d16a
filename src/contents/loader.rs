use anyhow::{bail, Context, Result};
use log::debug;
use std::path::Path;

use super::Contents;

/// Load content blocks from a delimiter-separated file of `block<delim>text` rows
pub fn load_contents(path: impl AsRef<Path>, delimiter: char) -> Result<Vec<Contents>> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .context(format!("Failed to read contents file: {:?}", path))?;

    let blocks = parse_contents(&source, delimiter)
        .context(format!("Failed to parse contents file: {:?}", path))?;

    debug!("Loaded {} blocks from {:?}", blocks.len(), path);
    Ok(blocks)
}

/// Group rows into blocks in order of first appearance
///
/// Blank lines and lines starting with `#` are skipped. A field wrapped in
/// double quotes may contain the delimiter; `""` inside it is a literal quote.
pub fn parse_contents(source: &str, delimiter: char) -> Result<Vec<Contents>> {
    let mut blocks: Vec<Contents> = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let number = number + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields = split_row(trimmed, delimiter).context(format!("line {}", number))?;
        let [block, text]: [String; 2] = match fields.try_into() {
            Ok(pair) => pair,
            Err(fields) => bail!(
                "line {}: expected 2 fields, found {}",
                number,
                fields.len()
            ),
        };

        if block.is_empty() {
            bail!("line {}: empty block name", number);
        }
        if text.is_empty() {
            bail!("line {}: empty text for block {:?}", number, block);
        }

        match blocks.iter_mut().find(|contents| contents.name() == block) {
            Some(contents) => contents.push(text),
            None => blocks.push(Contents::new(block, vec![text])),
        }
    }

    Ok(blocks)
}

fn split_row(row: &str, delimiter: char) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = row.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if quoted {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    quoted = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.trim().is_empty() {
            field.clear();
            quoted = true;
        } else if c == delimiter {
            fields.push(field.trim().to_string());
            field.clear();
        } else {
            field.push(c);
        }
    }

    if quoted {
        bail!("unterminated quoted field");
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}
