//! The generation pass: genesis, keys, then the two documents

use crate::error::Result;
use crate::genesis::{ChainIdSource, Genesis};
use crate::keys::KeyProvisioner;
use crate::values::{assemble, AccountKeys, ChainDocuments, ChainSettings, ContainerImages, BOOTSTRAP_ACCOUNTS};
use chrono::Utc;
use indicatif::ProgressBar;
use tracing::{debug, info};

/// Runs every external step in order and assembles the documents.
pub struct Bootstrap<'a> {
    pub chain_ids: &'a dyn ChainIdSource,
    pub keys: &'a dyn KeyProvisioner,
    pub progress: ProgressBar,
}

impl Bootstrap<'_> {
    pub fn generate(&self, settings: &ChainSettings, images: &ContainerImages) -> Result<ChainDocuments> {
        self.progress.set_message("Searching for a genesis chain id");
        let chain_id = self.chain_ids.chain_id()?;
        let genesis = Genesis::new(chain_id, Utc::now());
        info!("Genesis chain id: {}", genesis.genesis_chain_id);

        let accounts = self.provision_accounts()?;

        self.progress.finish_and_clear();
        Ok(assemble(settings, images, &genesis, &accounts))
    }

    fn provision_accounts(&self) -> Result<Vec<AccountKeys>> {
        BOOTSTRAP_ACCOUNTS
            .iter()
            .map(|name| {
                self.progress.set_message(format!("Generating keys for {}", name));
                let keys = self.keys.generate()?;
                debug!("Provisioned keys for {}", name);
                Ok(AccountKeys {
                    name: name.to_string(),
                    keys,
                })
            })
            .collect()
    }
}
