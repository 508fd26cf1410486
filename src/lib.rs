pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod format_csv;
pub mod masking;
pub mod normalize;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod project;
pub mod stream;
pub mod value;
pub mod verbose;
