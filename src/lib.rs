pub mod cli;
pub mod client;
pub mod metrics;
pub mod scale;
