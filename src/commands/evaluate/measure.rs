use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

use super::error::FairnessError;
use super::groups::{ProtectedGroup, TieBreaking};

pub const DEFAULT_GROUP_COL: &str = "group";

/// Fairness measures known to the evaluation pipeline. Only rND is
/// registered today; the enum keeps the registry closed and explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    NormalizedDiscountedDifference,
}

impl MeasureKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::NormalizedDiscountedDifference => "rND",
        }
    }

    fn resolve(name: &str) -> Option<Self> {
        match name {
            "rND" => Some(Self::NormalizedDiscountedDifference),
            _ => None,
        }
    }
}

/// A fairness measure with its effective parameters. Parsed from and
/// rendered to the canonical `Name@cutoff(param=value,...)` form, omitting
/// parameters left at their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FairnessMeasure {
    pub kind: MeasureKind,
    pub cutoff: Option<usize>,
    group_col: Option<String>,
    pub groups: Option<BTreeSet<String>>,
    pub protected_group: ProtectedGroup,
    pub tie_breaking: Option<TieBreaking>,
}

impl FairnessMeasure {
    pub fn new(kind: MeasureKind) -> Self {
        Self {
            kind,
            cutoff: None,
            group_col: None,
            groups: None,
            protected_group: ProtectedGroup::Minority,
            tie_breaking: None,
        }
    }

    pub fn group_col(&self) -> &str {
        self.group_col.as_deref().unwrap_or(DEFAULT_GROUP_COL)
    }

    /// Applies a fallback group column to measures that did not set one in
    /// their parameter list.
    pub fn default_group_col(&mut self, group_col: &str) {
        if self.group_col.is_none() && group_col != DEFAULT_GROUP_COL {
            self.group_col = Some(group_col.to_string());
        }
    }

    pub fn parse(raw: &str) -> Result<Self, FairnessError> {
        let pattern =
            Regex::new(r"^(?P<name>[A-Za-z][A-Za-z0-9]*)(?:@(?P<cutoff>\d+))?(?:\((?P<params>.*)\))?$")
                .map_err(|err| {
                    FairnessError::configuration(format!(
                        "failed to compile measure pattern: {err}"
                    ))
                })?;
        let Some(captures) = pattern.captures(raw.trim()) else {
            return Err(FairnessError::configuration(format!(
                "malformed measure string: {raw}"
            )));
        };

        let name = &captures["name"];
        let Some(kind) = MeasureKind::resolve(name) else {
            return Err(FairnessError::configuration(format!(
                "unknown measure: {name} (known measures: rND)"
            )));
        };

        let mut measure = Self::new(kind);
        if let Some(cutoff) = captures.name("cutoff") {
            let cutoff = cutoff.as_str().parse::<usize>().map_err(|_| {
                FairnessError::configuration(format!("invalid cutoff in measure: {raw}"))
            })?;
            measure.cutoff = Some(cutoff);
        }

        if let Some(params) = captures.name("params") {
            for (key, value) in split_params(params.as_str())? {
                measure.apply_param(&key, &value)?;
            }
        }

        Ok(measure)
    }

    fn apply_param(&mut self, key: &str, value: &str) -> Result<(), FairnessError> {
        match key {
            "group_col" => self.group_col = Some(value.to_string()),
            "groups" => {
                self.groups = Some(
                    value
                        .split('|')
                        .map(|group| group.trim().to_string())
                        .filter(|group| !group.is_empty())
                        .collect(),
                );
            }
            "protected_group" => self.protected_group = ProtectedGroup::parse(value),
            "tie_breaking" => self.tie_breaking = Some(TieBreaking::parse(value)),
            other => {
                return Err(FairnessError::configuration(format!(
                    "unknown measure parameter: {other}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for FairnessMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.name())?;
        if let Some(cutoff) = self.cutoff {
            write!(f, "@{cutoff}")?;
        }

        let mut params: Vec<String> = Vec::new();
        if self.group_col() != DEFAULT_GROUP_COL {
            params.push(format!("group_col={}", self.group_col()));
        }
        if let Some(groups) = &self.groups {
            let joined = groups.iter().cloned().collect::<Vec<String>>().join("|");
            params.push(format!("groups={joined}"));
        }
        if self.protected_group != ProtectedGroup::Minority {
            params.push(format!(
                "protected_group={}",
                self.protected_group.as_param()
            ));
        }
        if let Some(tie_breaking) = &self.tie_breaking {
            let rendered = tie_breaking.as_param();
            if rendered.contains(',') {
                params.push(format!("tie_breaking='{rendered}'"));
            } else {
                params.push(format!("tie_breaking={rendered}"));
            }
        }

        if !params.is_empty() {
            write!(f, "({})", params.join(","))?;
        }
        Ok(())
    }
}

/// Splits `key=value` pairs on top-level commas. Single-quoted values may
/// contain commas (preference-list tie breaking).
fn split_params(params: &str) -> Result<Vec<(String, String)>, FairnessError> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    let mut push_pair = |piece: &str| -> Result<(), FairnessError> {
        let piece = piece.trim();
        if piece.is_empty() {
            return Ok(());
        }
        let Some((key, value)) = piece.split_once('=') else {
            return Err(FairnessError::configuration(format!(
                "malformed measure parameter: {piece}"
            )));
        };
        let value = value.trim().trim_matches('\'');
        pairs.push((key.trim().to_string(), value.to_string()));
        Ok(())
    };

    for character in params.chars() {
        match character {
            '\'' => {
                in_quote = !in_quote;
                current.push(character);
            }
            ',' if !in_quote => {
                push_pair(&current)?;
                current.clear();
            }
            _ => current.push(character),
        }
    }
    if in_quote {
        return Err(FairnessError::configuration(format!(
            "unbalanced quote in measure parameters: {params}"
        )));
    }
    push_pair(&current)?;

    Ok(pairs)
}
