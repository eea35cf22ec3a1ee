pub mod catalog;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod error;
pub mod logging;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod scanner;
pub mod vision;
