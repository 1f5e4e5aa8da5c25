use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::RerankArgs;
use crate::tables::{load_run, write_run};
use crate::util::ensure_directory;

use super::strategy::{RerankParams, apply_strategy};

pub fn run(args: RerankArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.alpha) {
        bail!("alpha must be within [0, 1], got {}", args.alpha);
    }
    if !args.boost.is_finite() || args.boost <= 0.0 {
        bail!("boost must be a positive finite factor, got {}", args.boost);
    }

    let mut table = load_run(&args.run)?;
    let queries = table
        .docs
        .iter()
        .map(|doc| doc.query_id.clone())
        .collect::<std::collections::BTreeSet<String>>()
        .len();

    info!(
        run = %args.run.display(),
        rows = table.docs.len(),
        queries,
        strategy = args.strategy.as_str(),
        "starting rerank"
    );

    let params = RerankParams {
        balance_k: args.balance_k,
        alpha: args.alpha,
        stances: args.stances.clone(),
        boost: args.boost,
    };
    apply_strategy(&mut table, args.strategy, &params, args.verbose);

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                ensure_directory(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("failed to create run output: {}", path.display()))?;
            let mut output = BufWriter::new(file);
            write_run(&mut output, &table)?;
            output.flush()?;
            info!(path = %path.display(), "wrote reranked run");
        }
        None => {
            let mut output = BufWriter::new(io::stdout().lock());
            write_run(&mut output, &table)?;
            output.flush()?;
        }
    }

    info!(
        rows = table.docs.len(),
        strategy = args.strategy.as_str(),
        "rerank completed"
    );

    Ok(())
}
