pub mod cli;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod resolver;
pub mod translate;
pub mod worker;
