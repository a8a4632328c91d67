//! Chain and beacon collaborators for the Stader state engine.
//!
//! # Components
//!
//! - [`ChainRegistry`]: typed reads of the node registry and satellite
//!   contracts, pinned to an execution block
//! - [`BeaconSource`]: slot to execution-block resolution and batched
//!   validator statuses
//! - [`RpcChainRegistry`] / [`HttpBeaconSource`]: production clients
//! - [`StubChainRegistry`] / [`StubBeaconSource`]: in-memory clients for
//!   tests and dry runs
//!
//! # Example
//!
//! ```ignore
//! use stader_chain::{ClientConfig, ContractAddresses, HttpBeaconSource, RpcChainRegistry};
//!
//! let config = ClientConfig::default();
//! let registry = RpcChainRegistry::new("http://localhost:8545", contracts, &config)?;
//! let beacon = HttpBeaconSource::new("http://localhost:5052", &config)?;
//! ```

pub mod beacon_http;
pub mod config;
pub mod contracts;
pub mod error;
pub mod rpc_registry;
pub mod stub;
pub mod traits;

pub use beacon_http::HttpBeaconSource;
pub use config::{ClientConfig, ContractAddresses};
pub use error::{ChainError, ChainResult};
pub use rpc_registry::RpcChainRegistry;
pub use stub::{stub_block_hash, validator_status, StubBeaconSource, StubChainRegistry};
pub use traits::{BeaconSource, BlockTag, ChainRegistry, SlotTag, SocializingPoolRemaining};
