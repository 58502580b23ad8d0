use anyhow::{Context, Result};
use sortlab_core::{RunReport, Verdict};
use std::fmt::Write as _;
use std::path::Path;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn case_name(v: &Verdict) -> String {
    format!(
        "case {} (row {}, sign {}, size {})",
        v.case.number,
        v.case.table_index,
        v.sign.flag(),
        v.width
    )
}

pub fn render(report: &RunReport) -> String {
    let mut xml = String::new();
    let _ = writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        xml,
        r#"<testsuites name="sortlab" tests="{}" failures="{}">"#,
        report.final_score.total(),
        report.final_score.failed()
    );

    for score in [&report.swap, &report.sort] {
        let name = score.family.routine_name();
        let _ = writeln!(
            xml,
            r#"  <testsuite name="{}" tests="{}" failures="{}">"#,
            name, score.total, score.failed
        );
        for v in report.verdicts.iter().filter(|v| v.family == score.family) {
            let _ = write!(
                xml,
                r#"    <testcase classname="{}" name="{}""#,
                name,
                escape(&case_name(v))
            );
            if v.passed {
                let _ = writeln!(xml, "/>");
            } else {
                let message = if v.values_match {
                    format!("return value rejected: {:?}", v.aux)
                } else {
                    format!("expected [{}], got [{}]", join(&v.expected), join(&v.actual))
                };
                let _ = writeln!(xml, ">");
                let _ = writeln!(xml, r#"      <failure message="{}"/>"#, escape(&message));
                let _ = writeln!(xml, "    </testcase>");
            }
        }
        let _ = writeln!(xml, "  </testsuite>");
    }

    let _ = writeln!(xml, "</testsuites>");
    xml
}

pub fn write_junit(path: &Path, report: &RunReport) -> Result<()> {
    std::fs::write(path, render(report))
        .with_context(|| format!("Failed to write JUnit report {:?}", path))
}
