use std::collections::BTreeSet;

use crate::model::{GroupCounts, Judgment};

use super::error::FairnessError;

/// Strategy for picking the protected group from a query's group counts.
/// Any label that is not a known strategy name selects that group directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectedGroup {
    Minority,
    Majority,
    Explicit(String),
}

impl ProtectedGroup {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "minority" => Self::Minority,
            "majority" => Self::Majority,
            other => Self::Explicit(other.to_string()),
        }
    }

    pub fn as_param(&self) -> &str {
        match self {
            Self::Minority => "minority",
            Self::Majority => "majority",
            Self::Explicit(group) => group,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TieBreaking {
    Random,
    GroupAscending,
    GroupDescending,
    Preference(Vec<String>),
}

impl TieBreaking {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "random" => Self::Random,
            "group-ascending" => Self::GroupAscending,
            "group-descending" => Self::GroupDescending,
            other => Self::Preference(
                other
                    .split(',')
                    .map(|group| group.trim().to_string())
                    .collect(),
            ),
        }
    }

    pub fn as_param(&self) -> String {
        match self {
            Self::Random => "random".to_string(),
            Self::GroupAscending => "group-ascending".to_string(),
            Self::GroupDescending => "group-descending".to_string(),
            Self::Preference(groups) => groups.join(","),
        }
    }
}

/// Derives group population counts from one query's judgments. An empty
/// judgment set yields empty counts; absent groups still resolve to zero.
pub fn group_counts(
    judgments: &[Judgment],
    group_col: &str,
) -> Result<GroupCounts, FairnessError> {
    let mut counts = GroupCounts::new();
    for judgment in judgments {
        let Some(group) = judgment.attr(group_col) else {
            return Err(FairnessError::validation(format!(
                "judgment {}/{} has no group column '{}'",
                judgment.query_id, judgment.doc_id, group_col
            )));
        };
        counts.add(group);
    }
    Ok(counts)
}

/// Distinct group labels appearing in one query's judgments.
pub fn known_groups(
    judgments: &[Judgment],
    group_col: &str,
) -> Result<BTreeSet<String>, FairnessError> {
    let counts = group_counts(judgments, group_col)?;
    Ok(counts.iter().map(|(group, _)| group.to_string()).collect())
}

pub fn select_protected_group(
    counts: &GroupCounts,
    strategy: &ProtectedGroup,
    tie_breaking: Option<&TieBreaking>,
    seed: u64,
) -> Result<String, FairnessError> {
    let strategy_label = match strategy {
        ProtectedGroup::Explicit(group) => return Ok(group.clone()),
        ProtectedGroup::Minority => "minority",
        ProtectedGroup::Majority => "majority",
    };

    if counts.is_empty() {
        return Err(FairnessError::configuration(format!(
            "cannot select protected group by {strategy_label}: no groups were counted"
        )));
    }

    // Counts iterate alphabetically, so equal-count groups keep a stable
    // order through the sort.
    let mut groups: Vec<(&str, usize)> = counts.iter().collect();
    match strategy {
        ProtectedGroup::Minority => groups.sort_by(|left, right| left.1.cmp(&right.1)),
        ProtectedGroup::Majority => groups.sort_by(|left, right| right.1.cmp(&left.1)),
        ProtectedGroup::Explicit(_) => unreachable!("explicit group returned above"),
    }

    if groups.len() > 1 && groups[0].1 == groups[1].1 {
        let count = groups[0].1;
        let tied: Vec<&str> = groups
            .iter()
            .filter(|(_, group_count)| *group_count == count)
            .map(|(group, _)| *group)
            .collect();

        let Some(tie_breaking) = tie_breaking else {
            return Err(FairnessError::configuration(format!(
                "could not select protected group by {strategy_label} because of a tie: \
                 groups {tied:?} all occur {count} time(s)"
            )));
        };

        return break_tie(&tied, tie_breaking, seed);
    }

    Ok(groups[0].0.to_string())
}

fn break_tie(
    tied: &[&str],
    tie_breaking: &TieBreaking,
    seed: u64,
) -> Result<String, FairnessError> {
    match tie_breaking {
        TieBreaking::Random => {
            let index = xorshift_index(seed, tied.len());
            Ok(tied[index].to_string())
        }
        TieBreaking::GroupAscending => Ok(tied
            .iter()
            .min()
            .expect("tied groups are non-empty")
            .to_string()),
        TieBreaking::GroupDescending => Ok(tied
            .iter()
            .max()
            .expect("tied groups are non-empty")
            .to_string()),
        TieBreaking::Preference(preferences) => preferences
            .iter()
            .find(|preference| tied.contains(&preference.as_str()))
            .cloned()
            .ok_or_else(|| {
                FairnessError::validation(format!(
                    "tie breaking preference {preferences:?} not applicable to resolve tie: {tied:?}"
                ))
            }),
    }
}

fn xorshift_index(seed: u64, len: usize) -> usize {
    let mut rng = seed | 1;
    rng ^= rng << 13;
    rng ^= rng >> 7;
    rng ^= rng << 17;
    (rng as usize) % len
}
