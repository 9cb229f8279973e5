//! Formatted terminal output.
//!
//! All text rendering lives here so the pipeline stays free of presentation
//! concerns and output changes stay localized.

use crate::app::pipeline::Analysis;
use crate::domain::{AnalysisConfig, Growth, MergedTimeline};
use crate::taxonomy::{PathKeyResolver, TaxonomyTree};

/// Header block: what was selected and how it was forecast.
pub fn format_analysis_summary(analysis: &Analysis, tree: &TaxonomyTree, config: &AnalysisConfig) -> String {
    let mut out = String::new();

    out.push_str("=== mf - Market Forecast ===\n");
    out.push_str(&format!("Node: {} ({})\n", node_path(tree, analysis), analysis.node_id));
    out.push_str(&format!("Path key: {}\n", analysis.path_key));
    out.push_str(&format!(
        "Dataset: {} | series: {}\n",
        analysis.dataset_id,
        analysis.series_label.as_deref().unwrap_or("(unnamed)")
    ));

    let present = analysis.historical.values();
    out.push_str(&format!(
        "History: n={} | present={}",
        analysis.historical.len(),
        present.len()
    ));
    if let (Some(first), Some(last)) = (analysis.historical.points.first(), analysis.historical.last()) {
        out.push_str(&format!(" | span=[{}, {}]", first.period, last.period));
    }
    out.push('\n');

    let methods: Vec<&str> = config.methods.iter().map(|m| m.name()).collect();
    out.push_str(&format!(
        "Horizon: {} | methods: {} | smoothing: {:?} alpha={:.2}\n",
        config.horizon,
        methods.join(","),
        config.smoothing,
        config.alpha
    ));
    out.push('\n');

    out
}

/// Merged timeline table. Forecast columns follow the timeline's method order.
pub fn format_timeline(timeline: &MergedTimeline) -> String {
    let mut out = String::new();

    let mut header = format!("{:<10} {:>14}", "period", "historical");
    let mut rule = format!("{:-<10} {:-<14}", "", "");
    for m in &timeline.methods {
        header.push_str(&format!(" {:>14}", m.name()));
        rule.push_str(&format!(" {:-<14}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for (i, row) in timeline.rows.iter().enumerate() {
        let marker = if Some(i) == timeline.anchor_index { "*" } else { "" };
        let mut line = format!("{:<10} {:>14}", format!("{}{marker}", row.period), fmt_value(row.historical));
        for &m in &timeline.methods {
            line.push_str(&format!(" {:>14}", fmt_value(row.forecast(m))));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn format_growth(analysis: &Analysis) -> String {
    let mut out = String::new();
    out.push_str("CAGR:\n");
    out.push_str(&format!("- {:<10} {}\n", "historical", fmt_growth(analysis.growth.historical)));
    for (m, g) in &analysis.growth.forecasts {
        out.push_str(&format!("- {:<10} {}\n", m.name(), fmt_growth(*g)));
    }
    out
}

/// Full report: summary, timeline table, growth.
pub fn format_analysis(analysis: &Analysis, tree: &TaxonomyTree, config: &AnalysisConfig) -> String {
    let mut out = format_analysis_summary(analysis, tree, config);
    out.push_str(&format_timeline(&analysis.timeline));
    out.push('\n');
    out.push_str(&format_growth(analysis));
    out
}

/// Indented taxonomy listing with each node's path key. `has_data` marks nodes
/// that resolve to a dataset.
pub fn format_tree<F>(tree: &TaxonomyTree, mut has_data: F) -> String
where
    F: FnMut(i64) -> bool,
{
    let mut out = String::new();
    let mut stack: Vec<(i64, usize)> = tree.roots().map(|n| (n.id, 0)).collect();
    stack.reverse();
    let mut seen = std::collections::HashSet::new();
    let resolver = PathKeyResolver::new(tree);

    while let Some((id, depth)) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Some(node) = tree.get(id) else { continue };
        let key = match resolver.resolve(id) {
            Ok(key) => key.to_string(),
            Err(_) => "?".to_string(),
        };
        let mark = if has_data(id) { " [data]" } else { "" };
        out.push_str(&format!(
            "{}{} ({}) key={key}{mark}\n",
            "  ".repeat(depth),
            truncate(&node.name, 40),
            id
        ));
        for child in tree.children(id).into_iter().rev() {
            stack.push((child.id, depth + 1));
        }
    }

    out
}

fn node_path(tree: &TaxonomyTree, analysis: &Analysis) -> String {
    let names: Vec<&str> = analysis
        .path_key
        .ids()
        .iter()
        .filter_map(|id| tree.get(*id).map(|n| n.name.as_str()))
        .collect();
    names.join(" / ")
}

fn fmt_value(v: Option<f64>) -> String {
    match v {
        Some(x) => format!("{x:.2}"),
        None => "-".to_string(),
    }
}

fn fmt_growth(g: Growth) -> String {
    match g {
        Growth::Percent(p) => format!("{p:>8.2}%"),
        Growth::Undefined => "undefined".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::domain::{ForecastMethod, MergedRow, Period, TaxonomyNode};

    fn timeline() -> MergedTimeline {
        MergedTimeline {
            methods: vec![ForecastMethod::Linear],
            rows: vec![
                MergedRow {
                    period: Period::year(2024),
                    historical: Some(120.0),
                    forecasts: BTreeMap::from([(ForecastMethod::Linear, Some(120.0))]),
                },
                MergedRow {
                    period: Period::year(2025),
                    historical: None,
                    forecasts: BTreeMap::from([(ForecastMethod::Linear, Some(140.0))]),
                },
            ],
            anchor_index: Some(0),
        }
    }

    #[test]
    fn timeline_table_marks_anchor_and_nulls() {
        let text = format_timeline(&timeline());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("period"));
        assert!(lines[0].ends_with("linear"));
        assert!(lines[2].starts_with("2024*"));
        assert!(lines[2].ends_with("120.00"));
        assert!(lines[3].contains(" - "));
        assert!(lines[3].ends_with("140.00"));
    }

    #[test]
    fn tree_listing_indents_children() {
        let tree = TaxonomyTree::from_nodes(vec![
            TaxonomyNode::new(1, None, "Root"),
            TaxonomyNode::new(2, Some(1), "CV"),
            TaxonomyNode::new(3, Some(2), "India"),
        ]);
        let text = format_tree(&tree, |id| id == 3);
        assert_eq!(text, "Root (1) key=1\n  CV (2) key=1,2\n    India (3) key=1,2,3 [data]\n");
    }

    #[test]
    fn growth_prints_undefined() {
        assert_eq!(fmt_growth(Growth::Undefined), "undefined");
        assert_eq!(fmt_growth(Growth::Percent(9.544)), "    9.54%");
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
