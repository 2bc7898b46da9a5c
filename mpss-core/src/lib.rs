#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc = document_features::document_features!()]

pub mod board;
pub mod commitment;
pub mod config;
mod error;
pub mod messages;
pub mod metrics;
pub mod node;
pub mod polynomial;
pub mod serialization;
pub mod share;
mod slots;
mod traits;
pub mod transport;

#[cfg(any(test, feature = "test-impl"))]
pub mod tests;

#[cfg(feature = "test-impl")]
pub mod benches;

pub use board::BulletinBoard;
pub use commitment::{kate::CommitmentKey, PolyCommitment, ShareCommitment, Witness};
pub use config::{NetworkConfig, ProtocolConfig};
pub use error::{Error, FieldError, GroupError, ProtocolError};
pub use metrics::EpochMetrics;
pub use node::{Node, NodeStatus, Phase};
pub use polynomial::{lagrange_coefficients_at_zero, lagrange_interpolate, Polynomial};
pub use share::{deal_bivariate, deal_replicated, reconstruct_secret, recover_secret, ShareRecord};
pub use traits::{Field, FieldOf, G1Element, G2Element, Group, PairingSuite, Scalar};
pub use transport::{BoardService, InMemoryNetwork, NodeService, Transport};
