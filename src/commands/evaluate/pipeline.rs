use std::collections::BTreeMap;

use crate::model::{Judgment, MetricRecord, ScoredDocument};

use super::error::FairnessError;
use super::groups::{group_counts, known_groups, select_protected_group};
use super::measure::FairnessMeasure;
use super::rnd::normalized_discounted_difference;

/// Evaluates every measure over every query in the run. Rankings are sorted
/// by (query_id ascending, score descending) before grouping; per-measure
/// cutoffs truncate each query's ranking before scoring. Selection failures
/// propagate; no query is silently skipped.
pub fn evaluate(
    qrels: &[Judgment],
    run: &[ScoredDocument],
    measures: &[FairnessMeasure],
    tie_seed: u64,
) -> Result<Vec<MetricRecord>, FairnessError> {
    let mut sorted_run = run.to_vec();
    sorted_run.sort_by(|left, right| {
        left.query_id
            .cmp(&right.query_id)
            .then_with(|| right.score.total_cmp(&left.score))
    });

    let mut qrels_by_query: BTreeMap<&str, Vec<Judgment>> = BTreeMap::new();
    for judgment in qrels {
        qrels_by_query
            .entry(judgment.query_id.as_str())
            .or_default()
            .push(judgment.clone());
    }

    let run_by_query = group_run_by_query(&sorted_run);
    let empty_judgments: Vec<Judgment> = Vec::new();

    let mut records = Vec::new();
    for measure in measures {
        for (query_id, ranking) in &run_by_query {
            let ranking = match measure.cutoff {
                Some(cutoff) => &ranking[..cutoff.min(ranking.len())],
                None => ranking.as_slice(),
            };
            let judgments = qrels_by_query
                .get(query_id.as_str())
                .unwrap_or(&empty_judgments);

            let value = compute_query(measure, judgments, ranking, tie_seed)?;
            records.push(MetricRecord {
                query_id: query_id.clone(),
                measure: measure.to_string(),
                value,
            });
        }
    }

    Ok(records)
}

fn compute_query(
    measure: &FairnessMeasure,
    judgments: &[Judgment],
    ranking: &[ScoredDocument],
    tie_seed: u64,
) -> Result<f64, FairnessError> {
    let group_col = measure.group_col();
    let groups = match &measure.groups {
        Some(groups) => groups.clone(),
        None => known_groups(judgments, group_col)?,
    };

    let counts = group_counts(judgments, group_col)?;
    let protected_group = select_protected_group(
        &counts,
        &measure.protected_group,
        measure.tie_breaking.as_ref(),
        tie_seed,
    )?;

    if !groups.contains(&protected_group) {
        return Err(FairnessError::validation(format!(
            "protected group '{protected_group}' not found in groups {groups:?}"
        )));
    }

    normalized_discounted_difference(ranking, group_col, &counts, &protected_group)
}

/// Groups a query-sorted run into per-query rankings, keeping query order.
fn group_run_by_query(run: &[ScoredDocument]) -> Vec<(String, Vec<ScoredDocument>)> {
    let mut grouped: Vec<(String, Vec<ScoredDocument>)> = Vec::new();
    for doc in run {
        match grouped.last_mut() {
            Some((query_id, ranking)) if *query_id == doc.query_id => ranking.push(doc.clone()),
            _ => grouped.push((doc.query_id.clone(), vec![doc.clone()])),
        }
    }
    grouped
}
