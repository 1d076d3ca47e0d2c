pub mod backtest;
pub mod champion;
pub mod config;
pub mod display;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod sampler;
