pub mod evaluate;
pub mod rerank;
