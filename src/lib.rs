pub mod config;
pub mod error;
pub mod geometry;
pub mod heading;
pub mod neighbors;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod stats;
