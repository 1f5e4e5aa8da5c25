pub mod error;
pub mod groups;
pub mod measure;
pub mod pipeline;
pub mod rnd;
mod run;

#[cfg(test)]
mod tests;

pub use run::run;
