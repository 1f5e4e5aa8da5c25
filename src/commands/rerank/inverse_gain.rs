use std::collections::BTreeMap;

use crate::model::ScoredDocument;

pub const MISSING_STANCE_LABEL: &str = "NO";

/// Boosts under-represented stance labels: each configured label present in
/// the ranking gets a boost inversely proportional to its cumulative
/// presence, blended against min-max-normalized scores with weight alpha.
pub fn rerank_query(
    mut ranking: Vec<ScoredDocument>,
    stances: &[String],
    alpha: f64,
) -> Vec<ScoredDocument> {
    let labels: Vec<String> = ranking
        .iter()
        .map(|doc| {
            doc.stance_label
                .clone()
                .unwrap_or_else(|| MISSING_STANCE_LABEL.to_string())
        })
        .collect();

    let mut boosts: BTreeMap<&str, f64> = BTreeMap::new();
    for stance in stances {
        let presence = cumulative_presence(&labels, stance);
        if presence > 0.0 {
            boosts.insert(stance.as_str(), 1.0 / presence);
        }
    }

    normalize_scores(&mut ranking);
    for (doc, label) in ranking.iter_mut().zip(&labels) {
        // Labels outside the boost map fall back to a zero boost.
        let boost = boosts.get(label.as_str()).copied().unwrap_or(0.0);
        doc.score = (1.0 - alpha) * doc.score + alpha * boost;
    }

    ranking.sort_by(|left, right| right.score.total_cmp(&left.score));
    ranking
}

/// Cumulative presence of one stance label across the ranking. The current
/// formulation applies no position discount, so this is the occurrence
/// count.
fn cumulative_presence(labels: &[String], stance: &str) -> f64 {
    labels.iter().filter(|label| *label == stance).count() as f64
}

/// Min-max normalization of scores into [0, 1]. A constant-score ranking
/// normalizes to all zeros instead of dividing by zero.
fn normalize_scores(ranking: &mut [ScoredDocument]) {
    let min_score = ranking
        .iter()
        .map(|doc| doc.score)
        .fold(f64::INFINITY, f64::min);
    let max_score = ranking
        .iter()
        .map(|doc| doc.score)
        .fold(f64::NEG_INFINITY, f64::max);

    let range = max_score - min_score;
    for doc in ranking {
        doc.score = if range > 0.0 {
            (doc.score - min_score) / range
        } else {
            0.0
        };
    }
}
