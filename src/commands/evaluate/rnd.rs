use crate::model::{GroupCounts, ScoredDocument};

use super::error::FairnessError;

/// Normalized discounted difference (rND). Sums, over every rank prefix, the
/// log-discounted absolute deviation between the protected group's share of
/// the prefix and its share of the judged population. Lower is fairer; zero
/// means every prefix matches the population proportion exactly.
pub fn normalized_discounted_difference(
    ranking: &[ScoredDocument],
    group_col: &str,
    group_counts: &GroupCounts,
    protected_group: &str,
) -> Result<f64, FairnessError> {
    let population = group_counts.total();
    if population == 0 {
        return Err(FairnessError::validation(
            "cannot score fairness against an empty judged population",
        ));
    }
    let protected_total = group_counts.count(protected_group);
    let population_share = protected_total as f64 / population as f64;

    let mut rows: Vec<(usize, bool)> = Vec::with_capacity(ranking.len());
    for doc in ranking {
        let Some(rank) = doc.rank else {
            return Err(FairnessError::validation(format!(
                "document {}/{} has no rank",
                doc.query_id, doc.doc_id
            )));
        };
        let is_protected = doc.attr(group_col) == Some(protected_group);
        rows.push((rank, is_protected));
    }

    // Some runs use zero-indexed ranks; shift the whole ranking up by one to
    // repair them without altering relative order.
    if rows.iter().any(|(rank, _)| *rank == 0) {
        for row in &mut rows {
            row.0 += 1;
        }
    }

    let mut positions: Vec<usize> = rows.iter().map(|(rank, _)| *rank).collect();
    positions.sort_unstable();
    positions.dedup();

    let mut score = 0.0;
    for position in positions {
        let protected_in_prefix = rows
            .iter()
            .filter(|(rank, is_protected)| *rank <= position && *is_protected)
            .count();
        let prefix_share = protected_in_prefix as f64 / position as f64;
        let discount = 1.0 / ((position + 1) as f64).log2();
        score += discount * (prefix_share - population_share).abs();
    }

    Ok(score)
}
