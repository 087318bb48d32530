//! Persisting the values documents

use crate::error::Result;
use crate::values::{ChainDocuments, ChainValues};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of the files written for one chain
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFiles {
    pub creation: PathBuf,
    pub invitation: PathBuf,
}

pub struct ValuesWriter {
    dir: PathBuf,
}

impl ValuesWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn creation_file_name(chain_name: &str) -> String {
        format!("{}_values.yaml", chain_name)
    }

    pub fn invitation_file_name(chain_name: &str) -> String {
        format!("{}_invite_values.yaml", chain_name)
    }

    /// Write both documents, replacing any earlier run for the same chain.
    pub fn write(&self, chain_name: &str, documents: &ChainDocuments) -> Result<WrittenFiles> {
        fs::create_dir_all(&self.dir)?;

        let creation_name = Self::creation_file_name(chain_name);
        let creation = self.dir.join(&creation_name);
        write_yaml(&creation, &documents.creation)?;
        println!("Wrote create constants in {}", creation_name);

        let invitation_name = Self::invitation_file_name(chain_name);
        let invitation = self.dir.join(&invitation_name);
        write_yaml(&invitation, &documents.invitation)?;
        println!("Wrote invitation constants in {}", invitation_name);

        Ok(WrittenFiles {
            creation,
            invitation,
        })
    }
}

fn write_yaml(path: &Path, values: &ChainValues) -> Result<()> {
    let content = serde_yaml::to_string(values)?;
    fs::write(path, content)?;
    info!("Wrote {:?}", path);
    Ok(())
}
