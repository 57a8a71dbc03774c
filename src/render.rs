//! Plain-text rendering of a [`Walkthrough`] for the terminal.

use crate::attention::AttentionFocus;
use crate::pipeline::Walkthrough;
use crate::stage::Stage;
use ndarray::Array2;

const PRECISION: usize = 3;
const HEAT_RAMP: [char; 5] = [' ', '░', '▒', '▓', '█'];

/// Every stage, in order, separated by blank lines.
pub fn walkthrough(walkthrough: &Walkthrough) -> String {
    Stage::ALL
        .iter()
        .map(|&s| stage(walkthrough, s))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stage(walkthrough: &Walkthrough, stage: Stage) -> String {
    let mut out = format!("== {} ==\n{}\n\n", stage.title(), stage.description());
    match stage {
        Stage::Input => out.push_str(&input(walkthrough)),
        Stage::Tokenization => out.push_str(&token_table(walkthrough)),
        Stage::Embeddings => out.push_str(&matrix(&walkthrough.embeddings, walkthrough.sequence.tokens())),
        Stage::Positional => out.push_str(&matrix(&walkthrough.positional, walkthrough.sequence.tokens())),
        Stage::Attention => out.push_str(&heat_map(&walkthrough.attention, walkthrough.sequence.tokens())),
        Stage::FeedForward => {
            out.push_str("Hidden (after GELU):\n");
            out.push_str(&matrix(&walkthrough.feed_forward.hidden, walkthrough.sequence.tokens()));
            out.push_str("\nOutput:\n");
            out.push_str(&matrix(&walkthrough.feed_forward.output, walkthrough.sequence.tokens()));
        }
    }
    out
}

fn input(walkthrough: &Walkthrough) -> String {
    let text = &walkthrough.input_text;
    format!(
        "Text: \"{}\"\nCharacters: {}\nWords: {}\n",
        text,
        text.chars().count(),
        text.split_whitespace().count()
    )
}

/// Position, token, ID and type of every token, followed by the counts.
pub fn token_table(walkthrough: &Walkthrough) -> String {
    let tokens = walkthrough.sequence.tokens();
    let width = tokens.iter().map(|t| t.chars().count()).max().unwrap_or(0).max("Token".len());

    let mut out = format!("{:>4}  {:<width$}  {:>6}  {}\n", "Pos", "Token", "ID", "Type", width = width);
    for (position, ((token, id), kind)) in tokens
        .iter()
        .zip(&walkthrough.token_ids)
        .zip(walkthrough.sequence.kinds())
        .enumerate()
    {
        out.push_str(&format!("{:>4}  {:<width$}  {:>6}  {}\n", position, token, id, kind, width = width));
    }

    let stats = walkthrough.sequence.stats();
    out.push_str(&format!(
        "\nTotal: {}  Content: {}  Special: {}  Padding: {}\n",
        stats.total, stats.content, stats.special, stats.padding
    ));
    if walkthrough.sequence.is_truncated() {
        out.push_str("Input was truncated to fit the sequence length.\n");
    }
    out
}

/// One labelled row per token, values at fixed precision.
pub fn matrix(values: &Array2<f32>, labels: &[String]) -> String {
    let width = label_width(labels);
    let mut out = String::new();
    for (label, row) in labels.iter().zip(values.rows()) {
        let cells: Vec<String> = row.iter().map(|v| format!("{:>7.*}", PRECISION, v)).collect();
        out.push_str(&format!("{:<width$} {}\n", label, cells.join(" "), width = width));
    }
    out
}

/// Attention matrix as shaded blocks, one row per query token.
pub fn heat_map(weights: &Array2<f32>, labels: &[String]) -> String {
    let width = label_width(labels);
    let mut out = String::new();
    for (label, row) in labels.iter().zip(weights.rows()) {
        let max = row.iter().copied().fold(0.0f32, f32::max);
        let cells: String = row.iter().map(|&w| shade(w, max)).collect();
        out.push_str(&format!("{:<width$} |{}|\n", label, cells, width = width));
    }
    out
}

fn shade(weight: f32, max: f32) -> char {
    if max <= 0.0 {
        return HEAT_RAMP[0];
    }
    let level = ((weight / max) * (HEAT_RAMP.len() - 1) as f32).round() as usize;
    HEAT_RAMP[level.min(HEAT_RAMP.len() - 1)]
}

/// Ranked attention targets of one query token.
pub fn focus(focus: &AttentionFocus, tokens: &[String]) -> String {
    let query = tokens.get(focus.query).map(String::as_str).unwrap_or("?");
    let mut out = format!("Attention from position {} ({}):\n", focus.query, query);
    for (key, weight) in &focus.ranked {
        let token = tokens.get(*key).map(String::as_str).unwrap_or("?");
        let marker = if *key == focus.strongest { " <- strongest" } else { "" };
        out.push_str(&format!("{:>4}  {:<12} {:.*}{}\n", key, token, PRECISION, weight, marker));
    }
    out
}

/// Per-head variations of a single attention row.
pub fn head_views(views: &Array2<f32>) -> String {
    let mut out = String::new();
    for (head, row) in views.rows().into_iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.*}", PRECISION, v)).collect();
        out.push_str(&format!("head {:>2}: {}\n", head, cells.join(" ")));
    }
    out
}

fn label_width(labels: &[String]) -> usize {
    labels.iter().map(|l| l.chars().count()).max().unwrap_or(0)
}
