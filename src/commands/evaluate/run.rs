use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::EvaluateArgs;
use crate::model::{EvaluationReport, MeasureSummary, MetricRecord};
use crate::tables::{load_judgments, load_run};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

use super::measure::FairnessMeasure;
use super::pipeline;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let mut measures = Vec::with_capacity(args.measures.len());
    for raw in &args.measures {
        let mut measure =
            FairnessMeasure::parse(raw).with_context(|| format!("invalid measure: {raw}"))?;
        if let Some(group_col) = &args.group_col {
            measure.default_group_col(group_col);
        }
        measures.push(measure);
    }

    let (qrels_header, qrels) = load_judgments(&args.qrels)?;
    let run_table = load_run(&args.run)?;

    for measure in &measures {
        let group_col = measure.group_col();
        if !qrels_header.iter().any(|column| column == group_col) {
            bail!(
                "group column '{}' required by measure {} not found in qrels: {}",
                group_col,
                measure,
                args.qrels.display()
            );
        }
        if !run_table.has_column(group_col) {
            bail!(
                "group column '{}' required by measure {} not found in run: {}",
                group_col,
                measure,
                args.run.display()
            );
        }
    }

    info!(
        qrels = %args.qrels.display(),
        run = %args.run.display(),
        run_rows = run_table.docs.len(),
        measures = measures.len(),
        "starting fairness evaluation"
    );

    let metrics = pipeline::evaluate(&qrels, &run_table.docs, &measures, args.tie_seed)?;
    let summaries = summarize(&measures, &metrics);

    for summary in &summaries {
        info!(
            measure = %summary.measure,
            queries = summary.queries_evaluated,
            mean = summary.mean,
            "measure evaluated"
        );
    }

    let report = EvaluationReport {
        manifest_version: 1,
        generated_at: now_utc_string(),
        qrels_path: args.qrels.display().to_string(),
        qrels_sha256: sha256_file(&args.qrels)?,
        run_path: args.run.display().to_string(),
        run_sha256: sha256_file(&args.run)?,
        measures: summaries,
        per_query: args.per_query.then(|| metrics.clone()),
    };

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &report)?;
            info!(path = %path.display(), "wrote fairness report");
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut output, &report)
                .context("failed to serialize fairness report")?;
            writeln!(output)?;
            output.flush()?;
        }
    }

    Ok(())
}

fn summarize(measures: &[FairnessMeasure], metrics: &[MetricRecord]) -> Vec<MeasureSummary> {
    measures
        .iter()
        .map(|measure| {
            let rendered = measure.to_string();
            let values: Vec<f64> = metrics
                .iter()
                .filter(|record| record.measure == rendered)
                .map(|record| record.value)
                .collect();
            let mean = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            MeasureSummary {
                measure: rendered,
                queries_evaluated: values.len(),
                mean,
            }
        })
        .collect()
}
