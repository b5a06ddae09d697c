//! # asvec-client
//!
//! The remote surface the `asvec` admin tool talks to.
//!
//! The tool never speaks to a wire protocol directly. Every request goes
//! through the [`AdminClient`] trait, and clients are produced by a
//! [`Connector`]. [`tcp::TcpConnector`] dials real nodes and backs the
//! binary. With the `memory` feature, `memory::MemoryCluster` is an
//! in-process cluster that stores indexes, users and records and answers
//! topology questions for the end-to-end tests.
//!
//! ## Modules
//!
//! - [`index`] - index definitions, tuning parameters and status
//! - [`record`] - keys, values, vectors and search results
//! - [`cluster`] - node identity, endpoints and clustering facts
//! - [`connect`] - connection targets, credentials and TLS material
//! - [`client`] - the [`AdminClient`] and [`Connector`] traits
//! - [`tcp`] - the network connector
//! - [`error`] - [`ClientError`] and its status codes

#![deny(unsafe_code)]

pub mod client;
pub mod cluster;
pub mod connect;
pub mod error;
pub mod index;
#[cfg(feature = "memory")]
pub mod memory;
pub mod record;
pub mod tcp;

pub use client::{AdminClient, Connector};
pub use cluster::{About, ClusterEndpoints, ClusteringState, NodeId, NodeRole, ServerEndpoint};
pub use connect::{ConnectOptions, Credentials, Endpoint, HostPort, TlsMaterial, TlsVersion};
pub use error::{ClientError, Code, Result};
pub use index::{
    BatchingParams, CachingParams, DistanceMetric, HealerParams, HnswIndexUpdate, HnswParams,
    IndexDefinition, IndexId, IndexState, IndexStatus, IndexStorage, Labels, MergeParams,
};
pub use record::{Key, Neighbor, Record, Role, SearchParams, User, Value, Vector};
pub use tcp::TcpConnector;
