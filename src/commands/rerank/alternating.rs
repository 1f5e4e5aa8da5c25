use crate::model::ScoredDocument;

use super::strategy::reset_scores;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StanceSign {
    Positive,
    Negative,
    Neutral,
}

pub fn stance_sign(stance_value: Option<f64>) -> StanceSign {
    match stance_value {
        Some(value) if value > 0.0 => StanceSign::Positive,
        Some(value) if value < 0.0 => StanceSign::Negative,
        _ => StanceSign::Neutral,
    }
}

/// Greedy alternation over stance polarity: after a pro-A document, prefer
/// the best remaining pro-B or neutral document, and vice versa. When no
/// such candidate remains, the alternation state resets and the best
/// remaining document of any stance is taken.
pub fn rerank_query(mut remaining: Vec<ScoredDocument>) -> Vec<ScoredDocument> {
    let mut output = Vec::with_capacity(remaining.len());
    let mut last_sign = StanceSign::Neutral;

    while !remaining.is_empty() {
        let candidate = match last_sign {
            StanceSign::Neutral => Some(0),
            sign => remaining
                .iter()
                .position(|doc| stance_sign(doc.stance_value) != sign),
        };

        let Some(index) = candidate else {
            // No opposite or neutral candidate left; pick any document next.
            last_sign = StanceSign::Neutral;
            continue;
        };

        let doc = remaining.remove(index);
        last_sign = stance_sign(doc.stance_value);
        output.push(doc);
    }

    reset_scores(&mut output);
    output
}
