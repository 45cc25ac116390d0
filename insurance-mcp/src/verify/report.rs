//! Checklist output.

use super::context::TestResults;
use std::io::{self, Write};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const RULE_WIDTH: usize = 60;

/// Writes the human-readable checklist, with or without ANSI colour.
pub struct Reporter<W> {
    out: W,
    color: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, codes: &[&str], text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("{}{text}{RESET}", codes.concat())
    }

    pub fn banner(&mut self, base_url: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let lines = [
            self.paint(&[BOLD, BLUE], &rule),
            self.paint(&[BOLD, BLUE], "Insurance API Comprehensive Integration Tests"),
            self.paint(&[BOLD, BLUE], &rule),
        ];
        writeln!(self.out)?;
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "Base URL: {base_url}")
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        let title = self.paint(&[BOLD, BLUE], title);
        writeln!(self.out, "\n{title}")
    }

    /// One `✓ PASS` / `✗ FAIL` line, with the detail indented underneath.
    pub fn check(&mut self, name: &str, passed: bool, detail: Option<&str>) -> io::Result<()> {
        let status = if passed {
            self.paint(&[GREEN], "✓ PASS")
        } else {
            self.paint(&[RED], "✗ FAIL")
        };
        writeln!(self.out, "{status} - {name}")?;
        if let Some(detail) = detail.filter(|d| !d.is_empty()) {
            writeln!(self.out, "      {detail}")?;
        }
        Ok(())
    }

    pub fn skip(&mut self, message: &str) -> io::Result<()> {
        let line = self.paint(&[YELLOW], message);
        writeln!(self.out, "{line}")
    }

    pub fn warn(&mut self, message: &str) -> io::Result<()> {
        let line = self.paint(&[YELLOW], &format!("Cleanup warning: {message}"));
        writeln!(self.out, "{line}")
    }

    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    pub fn unreachable(&mut self, base_url: &str) -> io::Result<()> {
        let first = self.paint(&[RED], &format!("ERROR: Could not connect to {base_url}"));
        let second = self.paint(&[YELLOW], "Make sure the API server is running");
        writeln!(self.out, "\n{first}")?;
        writeln!(self.out, "{second}")
    }

    /// Print an error and its source chain.
    pub fn error(&mut self, err: &anyhow::Error) -> io::Result<()> {
        let head = self.paint(&[RED], &format!("ERROR: {err}"));
        writeln!(self.out, "\n{head}")?;
        for cause in err.chain().skip(1) {
            writeln!(self.out, "  caused by: {cause}")?;
        }
        Ok(())
    }

    pub fn summary(&mut self, results: &TestResults) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        let top = self.paint(&[BOLD], &rule);
        let title = self.paint(&[BOLD], "Test Summary");
        let passed = self.paint(&[GREEN], &format!("Passed: {}", results.passed));
        let failed = self.paint(&[RED], &format!("Failed: {}", results.failed));

        writeln!(self.out, "\n{top}")?;
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "Total Tests: {}", results.total)?;
        writeln!(self.out, "{passed}")?;
        writeln!(self.out, "{failed}")?;
        writeln!(self.out, "Success Rate: {:.1}%", results.success_rate())?;
        writeln!(self.out, "{rule}\n")?;
        self.out.flush()
    }
}
