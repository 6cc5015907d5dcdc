//! Case reports and their text/JSON rendering

use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::context::TestState;
use crate::common::Result;

const SYMBOL_INFO: &str = "\u{25ba}";
const SYMBOL_OK: &str = "\u{2714}";
const SYMBOL_NOK: &str = "\u{2716}";

/// Report format selectable from the command line or config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Final outcome of one expanded case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    pub description: String,
    pub state: TestState,
    pub log: Vec<String>,
    pub error: Option<String>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.state == TestState::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn of(reports: &[CaseReport]) -> Self {
        let passed = reports.iter().filter(|r| r.passed()).count();
        Self {
            total: reports.len(),
            passed,
            failed: reports.len() - passed,
        }
    }
}

pub struct Reporter {
    format: OutputFormat,
    color: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Render every report followed by the run summary
    pub fn render(&self, reports: &[CaseReport]) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(self.render_text(reports)),
            OutputFormat::Json => render_json(reports),
        }
    }

    fn render_text(&self, reports: &[CaseReport]) -> String {
        let mut out = String::new();
        for report in reports {
            self.write_case(&mut out, report);
        }

        let summary = Summary::of(reports);
        let failed = format!("{} failed", summary.failed);
        let failed = if self.color && summary.failed > 0 {
            failed.red().bold().to_string()
        } else {
            failed
        };
        out.push_str(&format!(
            "summary: {} cases, {} OK, {}\n",
            summary.total, summary.passed, failed
        ));
        out
    }

    fn write_case(&self, out: &mut String, report: &CaseReport) {
        let glyph = match (report.passed(), self.color) {
            (true, true) => SYMBOL_OK.green().to_string(),
            (false, true) => SYMBOL_NOK.red().to_string(),
            (true, false) => SYMBOL_OK.to_string(),
            (false, false) => SYMBOL_NOK.to_string(),
        };
        out.push_str(&format!("{} [test] {}\n", glyph, report.description));
        for line in &report.log {
            out.push_str(&format!("{} {}\n", SYMBOL_INFO, line));
        }
        if let (false, Some(error)) = (report.passed(), &report.error) {
            out.push_str(&format!("{} error: {}\n", SYMBOL_INFO, error));
        }
        out.push_str(if report.passed() { "OK\n" } else { "failed\n" });
        out.push('\n');
    }
}

fn render_json(reports: &[CaseReport]) -> Result<String> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        cases: &'a [CaseReport],
        summary: Summary,
    }

    let mut json = serde_json::to_string_pretty(&JsonReport {
        cases: reports,
        summary: Summary::of(reports),
    })?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed() -> CaseReport {
        CaseReport {
            description: "peer\\passive".into(),
            state: TestState::Success,
            log: vec![
                "prepare: initialize bgp test environment".into(),
                "case 01: set peer-flag [passive] on [1.1.1.1]".into(),
            ],
            error: None,
        }
    }

    fn failed() -> CaseReport {
        CaseReport {
            description: "peer\\ipv4-unicast\\as-override".into(),
            state: TestState::AssertError,
            log: vec!["prepare: initialize bgp test environment".into()],
            error: Some("assertion failed: member.value[false] == [true]".into()),
        }
    }

    #[test]
    fn test_text_layout() {
        let out = Reporter::new(OutputFormat::Text, false)
            .render(&[passed(), failed()])
            .unwrap();
        let expected = "\
\u{2714} [test] peer\\passive
\u{25ba} prepare: initialize bgp test environment
\u{25ba} case 01: set peer-flag [passive] on [1.1.1.1]
OK

\u{2716} [test] peer\\ipv4-unicast\\as-override
\u{25ba} prepare: initialize bgp test environment
\u{25ba} error: assertion failed: member.value[false] == [true]
failed

summary: 2 cases, 1 OK, 1 failed
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_json_layout() {
        let out = Reporter::new(OutputFormat::Json, true)
            .render(&[passed(), failed()])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["cases"][0]["state"], "SUCCESS");
        assert_eq!(value["cases"][1]["state"], "ASSERT_ERROR");
        assert_eq!(value["cases"][0]["error"], serde_json::Value::Null);
        assert_eq!(value["cases"][1]["log"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_summary_counts() {
        let summary = Summary::of(&[passed(), passed(), failed()]);
        assert_eq!(
            summary,
            Summary {
                total: 3,
                passed: 2,
                failed: 1
            }
        );
    }
}
