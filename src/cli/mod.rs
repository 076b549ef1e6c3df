//! CLI subcommand implementations for the lurebench binary.

pub mod build_cmd;
pub mod technique1_cmd;
pub mod technique2_cmd;
pub mod train_cmd;

use std::path::{Path, PathBuf};

/// Corpus file inside the data directory.
pub fn corpus_path(data_dir: &Path) -> PathBuf {
    data_dir.join("urls.csv")
}

/// Model artifact inside the data directory.
pub fn model_path(data_dir: &Path) -> PathBuf {
    data_dir.join("model.json")
}
