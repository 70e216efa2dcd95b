//! Core of kvstack: sloppy structural equality over records, space storage,
//! predicate evaluation and an in-process client.
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod equality;
pub mod error;
pub mod predicate;
pub mod provider;
pub mod registry;
pub mod state;
pub mod storage;

pub use client::{Client, ClientError, SearchOutcome, SearchRecord, SearchStream};
pub use config::KvStackConfig;
pub use equality::{equal_maps, equal_sets, equal_values};
pub use error::{KvStackError, KvStackResult};
pub use provider::KvStackProvider;
pub use registry::{ClusterAddr, ClusterRegistry};
