use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "fairrank",
    version,
    about = "Stance-fairness evaluation and reranking for ranked retrieval runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Evaluate(EvaluateArgs),
    Rerank(RerankArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[arg(long)]
    pub qrels: PathBuf,

    #[arg(long)]
    pub run: PathBuf,

    #[arg(long = "measure", default_values_t = vec!["rND".to_string()])]
    pub measures: Vec<String>,

    #[arg(long)]
    pub group_col: Option<String>,

    #[arg(long, default_value_t = false)]
    pub per_query: bool,

    #[arg(long, default_value_t = 0x5EED)]
    pub tie_seed: u64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RerankStrategy {
    Original,
    AlternatingStance,
    BalancedStance,
    InverseStanceGain,
    BoostMinorityStance,
}

impl RerankStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::AlternatingStance => "alternating-stance",
            Self::BalancedStance => "balanced-stance",
            Self::InverseStanceGain => "inverse-stance-gain",
            Self::BoostMinorityStance => "boost-minority-stance",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RerankArgs {
    #[arg(long)]
    pub run: PathBuf,

    #[arg(long, value_enum, default_value_t = RerankStrategy::Original)]
    pub strategy: RerankStrategy,

    #[arg(long, default_value_t = 5)]
    pub balance_k: usize,

    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,

    #[arg(long = "stance", default_values_t = vec![
        "FIRST".to_string(),
        "SECOND".to_string(),
        "NEUTRAL".to_string(),
        "NO".to_string(),
    ])]
    pub stances: Vec<String>,

    #[arg(long, default_value_t = 2.0)]
    pub boost: f64,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    #[arg(long)]
    pub output: Option<PathBuf>,
}
