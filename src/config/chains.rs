// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain definitions and built-in networks.

use alloy::primitives::{address, Address};
use url::Url;

/// Infrastructure of a production FHEVM chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionContracts {
    /// Access-control list contract
    pub acl_contract_address: Address,
    /// KMS verifier contract
    pub kms_contract_address: Address,
    /// Input verifier contract
    pub input_verifier_contract_address: Address,
    /// Gateway contract verifying decryption results
    pub verifying_contract_address_decryption: Address,
    /// Gateway contract verifying encrypted inputs
    pub verifying_contract_address_input_verification: Address,
    /// Chain id of the gateway chain
    pub gateway_chain_id: u64,
    /// Relayer endpoint
    pub relayer_url: Url,
    /// Public JSON-RPC endpoint of the host chain
    pub network_url: Url,
}

/// Chain class. Mock chains talk to a local node with simulated FHE; production
/// chains carry the full relayer/KMS address set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainKind {
    Mock { rpc_url: Url },
    Production(ProductionContracts),
}

/// A network the SDK can build an instance for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Chain ID
    pub id: u64,
    /// Network name for display
    pub name: String,
    /// Network slug (e.g. `sepolia`)
    pub network: String,
    /// Mock or production infrastructure
    pub kind: ChainKind,
}

impl Chain {
    /// Define a mock chain served by a local node.
    pub fn mock(id: u64, name: impl Into<String>, network: impl Into<String>, rpc_url: Url) -> Self {
        Self {
            id,
            name: name.into(),
            network: network.into(),
            kind: ChainKind::Mock { rpc_url },
        }
    }

    /// Define a production chain.
    pub fn production(
        id: u64,
        name: impl Into<String>,
        network: impl Into<String>,
        contracts: ProductionContracts,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            network: network.into(),
            kind: ChainKind::Production(contracts),
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self.kind, ChainKind::Mock { .. })
    }

    /// Local RPC URL of a mock chain.
    pub fn rpc_url(&self) -> Option<&Url> {
        match &self.kind {
            ChainKind::Mock { rpc_url } => Some(rpc_url),
            ChainKind::Production(_) => None,
        }
    }

    /// Infrastructure addresses of a production chain.
    pub fn contracts(&self) -> Option<&ProductionContracts> {
        match &self.kind {
            ChainKind::Production(contracts) => Some(contracts),
            ChainKind::Mock { .. } => None,
        }
    }
}

/// Chain ID of Ethereum Sepolia.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Chain ID of a local Hardhat node.
pub const HARDHAT_CHAIN_ID: u64 = 31_337;

/// Default RPC URL of a local Hardhat node.
pub const HARDHAT_RPC_URL: &str = "http://localhost:8545";

/// Sepolia testnet with the Zama testnet relayer.
pub fn sepolia() -> Chain {
    Chain::production(
        SEPOLIA_CHAIN_ID,
        "Sepolia",
        "sepolia",
        ProductionContracts {
            acl_contract_address: address!("687820221192C5B662b25367F70076A37bc79b6c"),
            kms_contract_address: address!("1364cBBf2cDF5032C47d8226a6f6FBD2AFCDacAC"),
            input_verifier_contract_address: address!("bc91f3daD1A5F19F8390c400196e58073B6a0BC4"),
            verifying_contract_address_decryption: address!(
                "b6E160B1ff80D67Bfe90A85eE06Ce0A2613607D1"
            ),
            verifying_contract_address_input_verification: address!(
                "7048C39f048125eDa9d678AEbaDfB22F7900a29F"
            ),
            gateway_chain_id: 55_815,
            relayer_url: Url::parse("https://relayer.testnet.zama.cloud")
                .expect("static relayer URL"),
            network_url: Url::parse("https://eth-sepolia.public.blastapi.io")
                .expect("static network URL"),
        },
    )
}

/// Local Hardhat node running the FHEVM mock stack.
pub fn hardhat() -> Chain {
    Chain::mock(
        HARDHAT_CHAIN_ID,
        "Hardhat",
        "hardhat",
        Url::parse(HARDHAT_RPC_URL).expect("static hardhat URL"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_class_determines_fields() {
        let local = hardhat();
        assert!(local.is_mock());
        assert_eq!(local.rpc_url().map(Url::as_str), Some("http://localhost:8545/"));
        assert!(local.contracts().is_none());

        let testnet = sepolia();
        assert!(!testnet.is_mock());
        assert!(testnet.rpc_url().is_none());
        let contracts = testnet.contracts().unwrap();
        assert_eq!(contracts.gateway_chain_id, 55_815);
        assert_eq!(testnet.id, SEPOLIA_CHAIN_ID);
    }
}
