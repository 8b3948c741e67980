// SPDX-License-Identifier: PMPL-1.0-or-later

//! Check: static analysis of a loaded catalog
//!
//! Walks every entry in key order looking for placeholder gaps and inline
//! references to absent tokens, then runs a three-colour DFS over the
//! reference graph to report cycles. The result is a [`CheckReport`] that
//! renders either as the plain-text report or as JSON.

pub mod graph;

use crate::catalog::Catalog;
use crate::token;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Process-style status code carried by a report.
pub type StatusCode = i32;

const RULE: &str = "------------------------------";

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Error,
}

/// One problem found in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// Placeholder indices are not `0..k` contiguous.
    PlaceholderGap { token: String, found: Vec<usize> },
    /// Inline reference to a key the catalog does not define.
    MissingRef { token: String, target: String },
    /// Reference cycle; the path ends with its first node repeated.
    Cycle { path: Vec<String> },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::PlaceholderGap { .. } => Severity::Warn,
            Finding::MissingRef { .. } | Finding::Cycle { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::PlaceholderGap { token, found } => {
                let found: Vec<String> = found.iter().map(|idx| format!("%{}", idx)).collect();
                write!(f, "WARN {}: placeholder gap, found: {}", token, found.join(", "))
            }
            Finding::MissingRef { token, target } => {
                write!(f, "ERROR {}: missing inline ref @{}", token, target)
            }
            Finding::Cycle { path } => write!(f, "ERROR CYCLE: {}", path.join(" -> ")),
        }
    }
}

/// Overall outcome of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Ok,
    OkWithWarnings,
    Fail,
    /// No catalog loaded, or the catalog has no entries.
    Empty,
}

impl Verdict {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Verdict::Ok | Verdict::OkWithWarnings => 0,
            Verdict::Empty => 2,
            Verdict::Fail => 3,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Ok => "CHECK: OK",
            Verdict::OkWithWarnings => "CHECK: OK (with warnings)",
            Verdict::Fail | Verdict::Empty => "CHECK: FAIL",
        }
    }
}

/// Complete check report
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub created_at: String,
    pub tokens: usize,
    pub warnings: usize,
    pub errors: usize,
    pub verdict: Verdict,
    pub status: StatusCode,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    fn new(tokens: usize, findings: Vec<Finding>) -> Self {
        let warnings = findings
            .iter()
            .filter(|f| f.severity() == Severity::Warn)
            .count();
        let errors = findings.len() - warnings;
        let verdict = if tokens == 0 {
            Verdict::Empty
        } else if errors > 0 {
            Verdict::Fail
        } else if warnings > 0 {
            Verdict::OkWithWarnings
        } else {
            Verdict::Ok
        };

        Self {
            created_at: chrono::Utc::now().to_rfc3339(),
            tokens,
            warnings,
            errors,
            verdict,
            status: verdict.status_code(),
            findings,
        }
    }

    /// Report for a missing or empty catalog.
    pub fn empty() -> Self {
        Self::new(0, Vec::new())
    }

    /// Plain-text rendering. Identical catalogs render identically.
    pub fn render(&self) -> String {
        if self.verdict == Verdict::Empty {
            return "CHECK: FAIL\nReason: catalog is empty or not loaded.\n".to_string();
        }

        let mut out = String::with_capacity(64 + self.findings.len() * 64);
        out.push_str("CHECK: REPORT\n");
        out.push_str(RULE);
        out.push('\n');
        for finding in &self.findings {
            out.push_str(&finding.to_string());
            out.push('\n');
        }
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("Tokens: {}\n", self.tokens));
        out.push_str(&format!("Warnings: {}\n", self.warnings));
        out.push_str(&format!("Errors: {}\n", self.errors));
        out.push_str(self.verdict.headline());
        out.push('\n');
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Check `catalog`; `None` stands for "nothing loaded".
pub fn check(catalog: Option<&Catalog>) -> CheckReport {
    let catalog = match catalog {
        Some(c) if !c.is_empty() => c,
        _ => return CheckReport::empty(),
    };

    let mut findings = Vec::new();
    let mut edges: BTreeMap<&str, Vec<String>> = BTreeMap::new();

    for (key, text) in catalog.entries() {
        let found = token::placeholder_indices(text);
        if found.iter().enumerate().any(|(expect, &got)| expect != got) {
            findings.push(Finding::PlaceholderGap {
                token: key.to_string(),
                found,
            });
        }

        let refs = token::inline_refs(text);
        for target in refs.iter().filter(|r| !catalog.contains(r)) {
            findings.push(Finding::MissingRef {
                token: key.to_string(),
                target: target.clone(),
            });
        }
        if !refs.is_empty() {
            edges.insert(key, refs);
        }
    }

    findings.extend(find_cycles(catalog, &edges));
    CheckReport::new(catalog.len(), findings)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Three-colour DFS with an explicit frame stack. Roots and edges are
/// visited in sorted order; edges to absent keys are skipped.
fn find_cycles(catalog: &Catalog, edges: &BTreeMap<&str, Vec<String>>) -> Vec<Finding> {
    let mut color: BTreeMap<&str, Color> = catalog.keys().map(|k| (k, Color::White)).collect();
    let mut cycles = Vec::new();
    let no_edges: Vec<String> = Vec::new();

    for root in catalog.keys() {
        if color.get(root) != Some(&Color::White) {
            continue;
        }

        // (node, index of the next edge to follow)
        let mut frames: Vec<(&str, usize)> = vec![(root, 0)];
        color.insert(root, Color::Gray);

        while let Some(frame) = frames.last_mut() {
            let (node, next) = *frame;
            let targets = edges.get(node).unwrap_or(&no_edges);

            let Some(target) = targets.get(next) else {
                color.insert(node, Color::Black);
                frames.pop();
                continue;
            };
            frame.1 += 1;

            // Absent targets are reported above, not walked.
            let Some((target, state)) = color.get_key_value(target.as_str()).map(|(k, c)| (*k, *c))
            else {
                continue;
            };
            match state {
                Color::White => {
                    color.insert(target, Color::Gray);
                    frames.push((target, 0));
                }
                Color::Gray => {
                    let start = frames
                        .iter()
                        .position(|(n, _)| *n == target)
                        .unwrap_or(0);
                    let mut path: Vec<String> =
                        frames[start..].iter().map(|(n, _)| n.to_string()).collect();
                    path.push(target.to_string());
                    cycles.push(Finding::Cycle { path });
                }
                Color::Black => {}
            }
        }
    }

    cycles
}
