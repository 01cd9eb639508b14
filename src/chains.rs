//! Known zkSync networks the charger can target

/// Static description of a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// Lookup key used in configuration
    pub key: &'static str,
    pub id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub block_explorer_url: Option<&'static str>,
    pub unsupported: bool,
}

impl NetworkDescriptor {
    /// Link to a transaction on the block explorer, if the network has one
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.block_explorer_url
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

static NETWORKS: &[NetworkDescriptor] = &[
    NetworkDescriptor {
        key: "zksync",
        id: 324,
        name: "zkSync",
        rpc_url: "https://mainnet.era.zksync.io",
        block_explorer_url: Some("https://explorer.zksync.io"),
        unsupported: false,
    },
    NetworkDescriptor {
        key: "zksync-sepolia",
        id: 300,
        name: "zkSync Sepolia Testnet",
        rpc_url: "https://sepolia.era.zksync.dev",
        block_explorer_url: Some("https://sepolia.explorer.zksync.io"),
        unsupported: false,
    },
    NetworkDescriptor {
        key: "zksync-goerli",
        id: 280,
        name: "zkSync Goerli Testnet",
        rpc_url: "https://testnet.era.zksync.dev",
        block_explorer_url: Some("https://goerli.explorer.zksync.io"),
        unsupported: true,
    },
    NetworkDescriptor {
        key: "dockerized-local",
        id: 270,
        name: "Dockerized local node",
        rpc_url: "http://localhost:3050",
        block_explorer_url: Some("http://localhost:3010"),
        unsupported: false,
    },
    NetworkDescriptor {
        key: "in-memory-local",
        id: 260,
        name: "In-memory local node",
        rpc_url: "http://127.0.0.1:8011",
        block_explorer_url: None,
        unsupported: false,
    },
];

/// All known networks
pub fn all() -> &'static [NetworkDescriptor] {
    NETWORKS
}

/// Look up a network by its configuration key
pub fn by_key(key: &str) -> Option<&'static NetworkDescriptor> {
    NETWORKS.iter().find(|n| n.key.eq_ignore_ascii_case(key))
}

/// Look up a network by chain id
pub fn by_id(id: u64) -> Option<&'static NetworkDescriptor> {
    NETWORKS.iter().find(|n| n.id == id)
}

/// zkSync Era mainnet
pub fn default_network() -> &'static NetworkDescriptor {
    &NETWORKS[0]
}
