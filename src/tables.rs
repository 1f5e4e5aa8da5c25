use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::model::{Judgment, ScoredDocument};

const QRELS_REQUIRED_COLUMNS: [&str; 2] = ["query_id", "doc_id"];
const RUN_REQUIRED_COLUMNS: [&str; 3] = ["query_id", "doc_id", "score"];

/// A ranking table plus the column layout it was loaded with, so the writer
/// can round-trip columns it does not interpret.
#[derive(Debug, Clone)]
pub struct RunTable {
    pub header: Vec<String>,
    pub docs: Vec<ScoredDocument>,
}

impl RunTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|column| column == name)
    }
}

pub fn load_judgments(path: &Path) -> Result<(Vec<String>, Vec<Judgment>)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read qrels file: {}", path.display()))?;
    parse_judgments(&text).with_context(|| format!("invalid qrels file: {}", path.display()))
}

pub fn parse_judgments(text: &str) -> Result<(Vec<String>, Vec<Judgment>)> {
    let mut lines = text.lines().enumerate();
    let header = parse_header(&mut lines, &QRELS_REQUIRED_COLUMNS)?;

    let mut judgments = Vec::new();
    for (line_index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let attrs = parse_row(&header, line, line_index)?;
        judgments.push(Judgment {
            query_id: attrs["query_id"].clone(),
            doc_id: attrs["doc_id"].clone(),
            attrs,
        });
    }

    Ok((header, judgments))
}

pub fn load_run(path: &Path) -> Result<RunTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read run file: {}", path.display()))?;
    parse_run(&text).with_context(|| format!("invalid run file: {}", path.display()))
}

pub fn parse_run(text: &str) -> Result<RunTable> {
    let mut lines = text.lines().enumerate();
    let header = parse_header(&mut lines, &RUN_REQUIRED_COLUMNS)?;
    let has_rank = header.iter().any(|column| column == "rank");

    let mut docs = Vec::new();
    for (line_index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let attrs = parse_row(&header, line, line_index)?;

        let score = attrs["score"]
            .parse::<f64>()
            .with_context(|| format!("invalid score on line {}: {}", line_index + 1, attrs["score"]))?;
        let rank = match attrs.get("rank").map(String::as_str) {
            Some("") | None => None,
            Some(raw) => Some(raw.parse::<usize>().with_context(|| {
                format!("invalid rank on line {}: {}", line_index + 1, raw)
            })?),
        };
        let stance_value = match attrs.get("stance_value").map(String::as_str) {
            Some("") | None => None,
            Some(raw) => Some(raw.parse::<f64>().with_context(|| {
                format!("invalid stance_value on line {}: {}", line_index + 1, raw)
            })?),
        };
        let stance_label = match attrs.get("stance_label").map(String::as_str) {
            Some("") | None => None,
            Some(raw) => Some(raw.to_string()),
        };

        docs.push(ScoredDocument {
            query_id: attrs["query_id"].clone(),
            doc_id: attrs["doc_id"].clone(),
            score,
            rank,
            stance_value,
            stance_label,
            attrs,
        });
    }

    let mut table = RunTable { header, docs };
    if !has_rank || table.docs.iter().any(|doc| doc.rank.is_none()) {
        derive_missing_ranks(&mut table.docs);
    }
    Ok(table)
}

/// Stamps 1-based ranks by per-query descending-score order without
/// reordering rows. Used when the input run carries no rank column.
fn derive_missing_ranks(docs: &mut [ScoredDocument]) {
    let mut by_query: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, doc) in docs.iter().enumerate() {
        by_query.entry(doc.query_id.clone()).or_default().push(index);
    }

    for indices in by_query.values() {
        let mut ordered = indices.clone();
        ordered.sort_by(|left, right| docs[*right].score.total_cmp(&docs[*left].score));
        for (position, index) in ordered.into_iter().enumerate() {
            docs[index].rank = Some(position + 1);
        }
    }
}

pub fn write_run<W: Write>(output: &mut W, table: &RunTable) -> Result<()> {
    let mut header = table.header.clone();
    if !table.has_column("rank") {
        header.push("rank".to_string());
    }
    writeln!(output, "{}", header.join("\t")).context("failed to write run header")?;

    for doc in &table.docs {
        let row = header
            .iter()
            .map(|column| run_cell(doc, column))
            .collect::<Vec<String>>();
        writeln!(output, "{}", row.join("\t")).context("failed to write run row")?;
    }

    Ok(())
}

fn run_cell(doc: &ScoredDocument, column: &str) -> String {
    match column {
        "score" => format_float(doc.score),
        "rank" => doc
            .rank
            .map(|rank| rank.to_string())
            .unwrap_or_default(),
        _ => doc.attr(column).unwrap_or_default().to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn parse_header<'a, I>(lines: &mut I, required: &[&str]) -> Result<Vec<String>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let Some((_, header_line)) = lines.next() else {
        bail!("empty table: missing header row");
    };

    let header = header_line
        .split('\t')
        .map(|column| column.trim().to_string())
        .collect::<Vec<String>>();

    for column in required {
        if !header.iter().any(|name| name == column) {
            bail!("missing required column: {column}");
        }
    }

    Ok(header)
}

fn parse_row(
    header: &[String],
    line: &str,
    line_index: usize,
) -> Result<BTreeMap<String, String>> {
    let fields = line.split('\t').collect::<Vec<&str>>();
    if fields.len() != header.len() {
        bail!(
            "line {} has {} fields, expected {}",
            line_index + 1,
            fields.len(),
            header.len()
        );
    }

    Ok(header
        .iter()
        .zip(fields)
        .map(|(column, field)| (column.clone(), field.trim().to_string()))
        .collect())
}
