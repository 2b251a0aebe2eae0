//! Command output: JSON for scripts, aligned text for people, or nothing at all.
//! Output goes to stdout unless `-o FILE` is given.

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

mod table;

pub use table::{TableRow, render_table};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Pretty,
    Table,
    Quiet,
}

#[derive(Clone, Debug)]
pub struct Output {
    format: OutputFormat,
    path: Option<PathBuf>,
}

impl Output {
    pub fn new(format: OutputFormat, path: Option<PathBuf>) -> Self {
        Self { format, path }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Writes `value` as JSON, or in table mode the text `describe` makes of it
    pub fn emit<T, F>(&self, value: &T, describe: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> Result<String>,
    {
        let data = match self.format {
            OutputFormat::Quiet => return Ok(()),
            OutputFormat::Table => describe(value)?,
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        self.write(data)
    }

    /// JSON in every mode except quiet; table mode prints it compact
    pub fn emit_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.emit(value, |value| Ok(serde_json::to_string(value)?))
    }

    /// Plain text in every mode except quiet
    pub fn emit_text(&self, text: &str) -> Result<()> {
        if self.format == OutputFormat::Quiet {
            return Ok(());
        }
        self.write(text.to_string())
    }

    fn write(&self, mut data: String) -> Result<()> {
        if !data.ends_with('\n') {
            data.push('\n');
        }
        match &self.path {
            Some(path) => fs::write(path, data).with_context(|| format!("write {}", path.display())),
            None => Ok(std::io::stdout().lock().write_all(data.as_bytes())?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_back(format: OutputFormat, name: &str, f: impl FnOnce(&Output) -> Result<()>) -> String {
        let path = std::env::temp_dir().join(format!("aqr-output-{}-{name}.out", std::process::id()));
        let _ = fs::remove_file(&path);
        f(&Output::new(format, Some(path.clone()))).expect("emit");
        let text = fs::read_to_string(&path).unwrap_or_default();
        let _ = fs::remove_file(&path);
        text
    }

    #[test]
    fn table_mode_uses_the_description() {
        let value = serde_json::json!({ "visited": 2 });
        let text = read_back(OutputFormat::Table, "table", |out| {
            out.emit(&value, |v| Ok(format!("visited {}", v["visited"])))
        });
        assert_eq!(text, "visited 2\n");

        let text = read_back(OutputFormat::Json, "json", |out| {
            out.emit(&value, |_| unreachable!("json mode"))
        });
        assert_eq!(text, "{\"visited\":2}\n");
    }

    #[test]
    fn quiet_writes_nothing() {
        let text = read_back(OutputFormat::Quiet, "quiet", |out| {
            out.emit_json(&[1, 2])?;
            out.emit_text("hello")
        });
        assert!(text.is_empty());
    }
}
