pub mod config;
pub mod diagnostics;
pub mod output;
pub mod round;
pub mod scoring;
pub mod session;
