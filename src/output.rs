//! Output layer for the wordmatch CLI.
//!
//! - stdout: data (phrases, match results, JSON)
//! - stderr: diagnostics (tracing logs, human-mode errors)

use colored::Colorize;
use serde::Serialize;

use crate::matcher::AnalyzeResult;

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub mode: OutputMode,
    pub quiet: bool,
}

impl Output {
    pub fn new(json: bool, quiet: bool) -> Self {
        Self {
            mode: if json {
                OutputMode::Json
            } else {
                OutputMode::Human
            },
            quiet,
        }
    }

    /// Write data to stdout (the command's "answer")
    pub fn data(&self, message: &str) {
        println!("{}", message);
    }

    /// Write JSON data to stdout
    pub fn json<T: Serialize>(&self, data: &T) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string_pretty(data)?;
        println!("{}", json);
        Ok(())
    }

    /// Write a progress message to stderr.
    /// Suppressed in JSON mode and when --quiet is set
    pub fn info(&self, message: &str) {
        if self.mode == OutputMode::Json || self.quiet {
            return;
        }
        eprintln!("{}", message);
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Print one match result in human form.
    pub fn match_result(&self, label: &str, result: &AnalyzeResult) {
        self.data(&format!(
            "{}  value={}  lexical={}",
            label.bold(),
            display_word(result.value.as_deref()),
            display_word(result.lexical.as_deref()),
        ));
    }
}

fn display_word(word: Option<&str>) -> String {
    match word {
        Some(w) => format!("{:?}", w).green().to_string(),
        None => "null".dimmed().to_string(),
    }
}

/// JSON error payload (written to stdout with non-zero exit).
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub exit_code: i32,
}

impl JsonError {
    pub fn new(message: impl Into<String>, details: Option<String>, exit_code: i32) -> Self {
        Self {
            ok: false,
            error: message.into(),
            details,
            exit_code,
        }
    }

    /// Print this error as JSON to stdout
    pub fn print(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{{\"ok\":false}}"),
        }
    }
}

/// JSON payload for `match`.
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub ok: bool,
    pub text: String,
    pub candidates: usize,
    pub value_strategy: String,
    pub lexical_strategy: String,
    pub result: AnalyzeResult,
}

/// JSON payload for `phrases list`.
#[derive(Debug, Serialize)]
pub struct PhrasesResponse {
    pub ok: bool,
    pub count: usize,
    pub phrases: Vec<String>,
}
