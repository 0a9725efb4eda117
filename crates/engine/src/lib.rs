pub mod config;
pub mod extraction;
pub mod pairing;
pub mod pipeline;
pub mod routes;
pub mod scoring;
pub mod sources;
pub mod verification;

pub use pipeline::Analyzer;
