use tracing::info;

use crate::cli::RerankStrategy;
use crate::model::ScoredDocument;
use crate::tables::RunTable;

use super::{alternating, balanced, boost_minority, inverse_gain};

#[derive(Debug, Clone)]
pub struct RerankParams {
    pub balance_k: usize,
    pub alpha: f64,
    pub stances: Vec<String>,
    pub boost: f64,
}

/// Applies a reranking strategy to every query of the run, in place. Queries
/// keep their first-appearance order; within a query, rows are processed in
/// rank order and emerge with freshly derived 1-based ranks.
pub fn apply_strategy(
    table: &mut RunTable,
    strategy: RerankStrategy,
    params: &RerankParams,
    verbose: bool,
) {
    let groups = take_query_groups(table);
    let mut output = Vec::with_capacity(groups.iter().map(|(_, docs)| docs.len()).sum());

    for (query_id, ranking) in groups {
        let size = ranking.len();
        let mut reranked = match strategy {
            RerankStrategy::Original => ranking,
            RerankStrategy::AlternatingStance => alternating::rerank_query(ranking),
            RerankStrategy::BalancedStance => balanced::rerank_query(ranking, params.balance_k),
            RerankStrategy::InverseStanceGain => {
                inverse_gain::rerank_query(ranking, &params.stances, params.alpha)
            }
            RerankStrategy::BoostMinorityStance => {
                boost_minority::rerank_query(ranking, params.boost)
            }
        };
        add_ranks(&mut reranked);

        if verbose {
            info!(
                query_id = %query_id,
                documents = size,
                strategy = strategy.as_str(),
                "reranked query"
            );
        }
        output.extend(reranked);
    }

    table.docs = output;
}

/// Drains the table into per-query rankings, preserving the order in which
/// queries first appear and ordering each ranking by ascending rank.
fn take_query_groups(table: &mut RunTable) -> Vec<(String, Vec<ScoredDocument>)> {
    let mut groups: Vec<(String, Vec<ScoredDocument>)> = Vec::new();
    for doc in table.docs.drain(..) {
        match groups
            .iter_mut()
            .find(|(query_id, _)| *query_id == doc.query_id)
        {
            Some((_, ranking)) => ranking.push(doc),
            None => groups.push((doc.query_id.clone(), vec![doc])),
        }
    }

    for (_, ranking) in &mut groups {
        ranking.sort_by(|left, right| match (left.rank, right.rank) {
            (Some(left_rank), Some(right_rank)) => left_rank.cmp(&right_rank),
            _ => right.score.total_cmp(&left.score),
        });
    }

    groups
}

/// Stable-sorts one query's rows by descending score and stamps 1-based
/// ranks, so the rank field is consistent with the new score order.
pub fn add_ranks(ranking: &mut [ScoredDocument]) {
    ranking.sort_by(|left, right| right.score.total_cmp(&left.score));
    for (position, doc) in ranking.iter_mut().enumerate() {
        doc.rank = Some(position + 1);
    }
}

/// Overwrites scores with the strictly descending sequence n, n-1, ..., 1 so
/// downstream rank derivation matches the current order exactly.
pub fn reset_scores(ranking: &mut [ScoredDocument]) {
    let size = ranking.len();
    for (position, doc) in ranking.iter_mut().enumerate() {
        doc.score = (size - position) as f64;
    }
}
