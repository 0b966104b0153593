//! CLI subcommands.

mod analyze;
mod upload;

pub(crate) use analyze::AnalyzeArgs;
pub(crate) use upload::UploadArgs;
