use crate::model::ScoredDocument;

use super::strategy::reset_scores;

/// Balances pro-A and pro-B stances within the top-k window by corrective
/// swaps: while one polarity outnumbers the other by more than one, the last
/// over-represented document inside the window is moved to just behind the
/// first under-represented document after the window. When no qualifying
/// pair exists the partially balanced ranking is kept (best effort, not a
/// failure). k = 0 leaves the order untouched.
pub fn rerank_query(mut ranking: Vec<ScoredDocument>, k: usize) -> Vec<ScoredDocument> {
    let k = k.min(ranking.len());

    loop {
        let pro_a = count_sign(&ranking[..k], true);
        let pro_b = count_sign(&ranking[..k], false);
        if pro_a.abs_diff(pro_b) <= 1 {
            break;
        }

        // Search for the over-represented polarity in the top k-1 positions
        // and the under-represented one after position k.
        let surplus_positive = pro_a > pro_b;
        let head = &ranking[..k.saturating_sub(1)];
        let surplus_index = head
            .iter()
            .rposition(|doc| matches_sign(doc, surplus_positive));
        let deficit_index = ranking[k..]
            .iter()
            .position(|doc| matches_sign(doc, !surplus_positive))
            .map(|offset| k + offset);

        let (Some(surplus_index), Some(deficit_index)) = (surplus_index, deficit_index) else {
            break;
        };

        // After the removal the deficit document sits at deficit_index - 1,
        // so inserting at deficit_index places the moved document right
        // behind it. Each swap reduces the window imbalance by two.
        let doc = ranking.remove(surplus_index);
        ranking.insert(deficit_index, doc);
    }

    reset_scores(&mut ranking);
    ranking
}

fn count_sign(window: &[ScoredDocument], positive: bool) -> usize {
    window.iter().filter(|doc| matches_sign(doc, positive)).count()
}

fn matches_sign(doc: &ScoredDocument, positive: bool) -> bool {
    match doc.stance_value {
        Some(value) if positive => value > 0.0,
        Some(value) => value < 0.0,
        None => false,
    }
}
