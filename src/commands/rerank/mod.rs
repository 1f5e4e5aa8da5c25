pub mod alternating;
pub mod balanced;
pub mod boost_minority;
pub mod inverse_gain;
mod run;
pub mod strategy;


pub use run::run;
