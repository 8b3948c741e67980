// SPDX-License-Identifier: PMPL-1.0-or-later

//! Graphviz DOT export of the inline-reference graph.

use crate::catalog::Catalog;
use crate::token;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Render `catalog` as a `digraph`. Edges to absent keys point at red
/// `(MISSING)` nodes; labels are shown under their token.
pub fn to_dot(catalog: &Catalog) -> String {
    let mut out = String::new();
    out.push_str("digraph HexlocReferences {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, style=filled, fillcolor=white];\n");

    for key in catalog.keys() {
        let label = match catalog.label(key) {
            Some(label) => format!("{}\\n({})", key, escape(label)),
            None => key.to_string(),
        };
        let _ = writeln!(out, "  \"{}\" [label=\"{}\"];", key, label);
    }

    let mut missing = BTreeSet::new();
    let mut edges = Vec::new();
    for (key, text) in catalog.entries() {
        for target in token::inline_refs(text) {
            if !catalog.contains(&target) {
                missing.insert(target.clone());
            }
            edges.push((key, target));
        }
    }

    for target in &missing {
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\\n(MISSING)\", fillcolor=red];",
            target, target
        );
    }
    for (from, to) in &edges {
        let _ = writeln!(out, "  \"{}\" -> \"{}\";", from, to);
    }

    out.push_str("}\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
