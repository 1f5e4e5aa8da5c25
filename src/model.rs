use std::collections::BTreeMap;

use serde::Serialize;

/// One row of the judgment (qrels) table. Columns beyond the two identifiers
/// stay in `attrs` so any column can serve as the group attribute.
#[derive(Debug, Clone)]
pub struct Judgment {
    pub query_id: String,
    pub doc_id: String,
    pub attrs: BTreeMap<String, String>,
}

impl Judgment {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// One row of a ranking (run) table for a single query.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub query_id: String,
    pub doc_id: String,
    pub score: f64,
    pub rank: Option<usize>,
    pub stance_value: Option<f64>,
    pub stance_label: Option<String>,
    pub attrs: BTreeMap<String, String>,
}

impl ScoredDocument {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Group population counts for one query, defaulting absent groups to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCounts(BTreeMap<String, usize>);

impl GroupCounts {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn add(&mut self, group: &str) {
        *self.0.entry(group.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, group: &str) -> usize {
        self.0.get(group).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(group, count)| (group.as_str(), *count))
    }
}

impl FromIterator<(String, usize)> for GroupCounts {
    fn from_iter<I: IntoIterator<Item = (String, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One fairness score for one (query, measure) pair.
#[derive(Debug, Clone, Serialize)]
pub struct MetricRecord {
    pub query_id: String,
    pub measure: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeasureSummary {
    pub measure: String,
    pub queries_evaluated: usize,
    pub mean: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub qrels_path: String,
    pub qrels_sha256: String,
    pub run_path: String,
    pub run_sha256: String,
    pub measures: Vec<MeasureSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_query: Option<Vec<MetricRecord>>,
}
