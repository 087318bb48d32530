//! Helm values for the tezos-chain chart
//!
//! A run produces two documents from the same inputs: the creation values,
//! holding secret keys for whoever originates the chain, and the invitation
//! values, holding only public keys for peers that join it.

use crate::error::{MkchainError, Result};
use crate::genesis::Genesis;
use crate::keys::KeyPair;
use serde::Serialize;

/// Accounts seeded into genesis, in values order
pub const BOOTSTRAP_ACCOUNTS: [&str; 4] = ["baker", "bootstrap_account_1", "bootstrap_account_2", "genesis"];

/// Validated per-chain settings from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    pub chain_name: String,
    pub number_of_nodes: usize,
    pub zerotier_network: Option<String>,
    pub zerotier_token: Option<String>,
    pub bootstrap_peer: Option<String>,
    pub rpc_auth: bool,
}

impl ChainSettings {
    /// Reject node counts below one; everything else passes through.
    pub fn new(
        chain_name: impl Into<String>,
        number_of_nodes: i64,
        zerotier_network: Option<String>,
        zerotier_token: Option<String>,
        bootstrap_peer: Option<String>,
        rpc_auth: bool,
    ) -> Result<Self> {
        let number_of_nodes = usize::try_from(number_of_nodes)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(MkchainError::InvalidNodeCount(number_of_nodes))?;

        Ok(Self {
            chain_name: chain_name.into(),
            number_of_nodes,
            zerotier_network,
            zerotier_token,
            bootstrap_peer,
            rpc_auth,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerImages {
    pub zerotier_docker_image: String,
    pub rpc_auth_image: String,
    pub tezos_docker_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZerotierConfig {
    pub zerotier_network: Option<String>,
    pub zerotier_token: Option<String>,
}

/// One peer in the cluster; only the first bakes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeRole {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bake_for: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub name: String,
    pub key: String,
    pub private: bool,
    pub bootstrap: bool,
    pub baker: bool,
}

/// A single values document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainValues {
    pub chain_name: String,
    pub container_images: ContainerImages,
    pub genesis: Genesis,
    pub zerotier_in_use: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_auth: Option<bool>,
    pub zerotier_config: ZerotierConfig,
    pub nodes: Vec<NodeRole>,
    pub accounts: Vec<Account>,
    pub is_invitation: bool,
    pub bootstrap_peers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainDocuments {
    pub creation: ChainValues,
    pub invitation: ChainValues,
}

/// Keys for one bootstrap account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountKeys {
    pub name: String,
    pub keys: KeyPair,
}

pub fn nodes(count: usize) -> Vec<NodeRole> {
    let mut nodes = vec![NodeRole::default(); count];
    if let Some(first) = nodes.first_mut() {
        first.bake_for = Some("baker".into());
    }
    nodes
}

fn account(name: &str, key: &str, private: bool) -> Account {
    Account {
        name: name.into(),
        key: key.into(),
        private,
        bootstrap: true,
        baker: true,
    }
}

/// Build the creation and invitation documents.
pub fn assemble(
    settings: &ChainSettings,
    images: &ContainerImages,
    genesis: &Genesis,
    accounts: &[AccountKeys],
) -> ChainDocuments {
    let zerotier_in_use = settings
        .zerotier_network
        .as_deref()
        .is_some_and(|n| !n.is_empty());

    let creation = ChainValues {
        chain_name: settings.chain_name.clone(),
        container_images: images.clone(),
        genesis: genesis.clone(),
        zerotier_in_use,
        rpc_auth: Some(settings.rpc_auth),
        zerotier_config: ZerotierConfig {
            zerotier_network: settings.zerotier_network.clone(),
            zerotier_token: settings.zerotier_token.clone(),
        },
        nodes: nodes(settings.number_of_nodes),
        accounts: accounts
            .iter()
            .map(|a| account(&a.name, &a.keys.secret_key, true))
            .collect(),
        is_invitation: false,
        bootstrap_peers: settings
            .bootstrap_peer
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect(),
    };

    let invitation = ChainValues {
        rpc_auth: None,
        accounts: accounts
            .iter()
            .map(|a| account(&a.name, &a.keys.public_key, false))
            .collect(),
        is_invitation: true,
        ..creation.clone()
    };

    ChainDocuments {
        creation,
        invitation,
    }
}
