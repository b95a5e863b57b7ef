// src/render.rs
use crate::evaluate::{ColumnReport, EvaluationReport};

fn pct(x: f64) -> String {
    format!("{:.2}%", x * 100.0)
}

fn render_confusion(c: &ColumnReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("| actual \\ predicted | {} |\n", c.labels.join(" | ")));
    out.push_str(&format!("|---|{}\n", "---|".repeat(c.labels.len())));
    for (label, row) in c.labels.iter().zip(&c.confusion) {
        let cells: Vec<String> = row.iter().map(|n| n.to_string()).collect();
        out.push_str(&format!("| **{}** | {} |\n", label, cells.join(" | ")));
    }
    out
}

pub fn render_evaluation_markdown(r: &EvaluationReport) -> String {
    let mut md = String::new();
    md.push_str("# Prediction Evaluation\n\n");
    md.push_str(&format!(
        "- Input: `{}`\n- Strategy: {}\n- Lexicon: `{}`\n- Examples: {} ({} without a body)\n- Wrong predictions: {}\n\n",
        r.input,
        r.strategy,
        r.lexicon_fingerprint,
        r.examples,
        r.skipped,
        r.errors.len()
    ));

    let mut ranked: Vec<&ColumnReport> = r.columns.iter().filter(|c| c.total > 0).collect();
    ranked.sort_by(|a, b| a.macro_f1.total_cmp(&b.macro_f1));
    if !ranked.is_empty() {
        md.push_str("## Lowest Performing Labels\n");
        for c in &ranked {
            md.push_str(&format!(
                "- {}: macro F1 = {:.2}, accuracy = {} ({} out of {})\n",
                c.column,
                c.macro_f1,
                pct(c.accuracy),
                c.correct,
                c.total
            ));
        }
        md.push('\n');
    }

    for c in &r.columns {
        md.push_str(&format!("## {}\n", c.column));
        if c.total == 0 {
            md.push_str("No labeled examples.\n\n");
            continue;
        }
        md.push_str("| label | precision | recall | f1 | support |\n|---|---|---|---|---|\n");
        for k in &c.classes {
            md.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} | {} |\n",
                k.label, k.precision, k.recall, k.f1, k.support
            ));
        }
        md.push('\n');
        md.push_str(&render_confusion(c));
        md.push('\n');
    }

    md
}
