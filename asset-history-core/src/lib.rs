#![doc = "asset-history-core: replays the version history of a remote asset into files or a git repository."]

//! The pipeline lists every version of an asset, orders them by version number and writes them
//! out one at a time, optionally through an external transform command, optionally as git
//! commits dated at each version's creation time.
//!
//! # Usage
//! Build a [`config::PipelineConfig`] and a [`download::RemoteClient`], then call
//! [`synchronise::synchronise`].

pub mod auth;
pub mod command;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod filename;
pub mod listing;
pub mod recorder;
pub mod synchronise;
pub mod transform;
pub mod version;

pub use error::{Error, Result};
pub use version::AssetVersion;
