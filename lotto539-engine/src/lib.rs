pub mod backtest;
pub mod config;
pub mod cooccurrence;
pub mod error;
pub mod history;
pub mod recommend;
pub mod scoring;
pub mod stats;

pub use backtest::{BacktestConfig, BacktestResult, Strategy};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use history::History;
