use crate::model::ScoredDocument;

use super::inverse_gain::MISSING_STANCE_LABEL;

pub const CANONICAL_STANCES: [&str; 4] = ["FIRST", "SECOND", "NEUTRAL", "NO"];

/// Amplifies the single least-represented canonical stance label: documents
/// carrying that label have their score multiplied by the boost factor, all
/// others stay unchanged. Ranks are re-derived from the new scores by the
/// caller. Labels absent from the ranking are skipped (boosting them would
/// be a no-op); count ties resolve to the first label in canonical order.
pub fn rerank_query(mut ranking: Vec<ScoredDocument>, boost: f64) -> Vec<ScoredDocument> {
    let minority = CANONICAL_STANCES
        .iter()
        .map(|stance| (*stance, label_count(&ranking, stance)))
        .filter(|(_, count)| *count > 0)
        .min_by_key(|(_, count)| *count)
        .map(|(stance, _)| stance);

    let Some(minority) = minority else {
        return ranking;
    };

    for doc in &mut ranking {
        if doc_label(doc) == minority {
            doc.score *= boost;
        }
    }

    ranking
}

fn label_count(ranking: &[ScoredDocument], stance: &str) -> usize {
    ranking.iter().filter(|doc| doc_label(doc) == stance).count()
}

fn doc_label(doc: &ScoredDocument) -> &str {
    doc.stance_label.as_deref().unwrap_or(MISSING_STANCE_LABEL)
}
