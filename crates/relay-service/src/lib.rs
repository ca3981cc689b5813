//! Relay node service.
//!
//! Wires the protocol components into a genesis ledger from configuration
//! and exposes one method per protocol entry point. The `relay-node` binary
//! drives it from the command line.
//!
//! # Components
//!
//! - `cli`: command-line interface
//! - `node`: genesis builder, entry points and snapshot persistence

pub mod cli;
pub mod node;

pub use node::{Deployment, ManagerStatus, NodeError, NodeStatus, RelayNode, RelayNodeBuilder};
