//! Zegami API client.
//!
//! Thin blocking wrapper over the Zegami REST API: create and update
//! collections, create imagesets and joined datasets, upload TSV data and
//! PNG images.
//!
//! No retries. No pagination. No timeout beyond the transport's own.

mod client;
mod config;
mod error;
pub mod http;

pub use client::{
    ZegamiClient, PNG_TYPE, TSV_TYPE,
    collection_info, imageset_info, join_info,
};
pub use config::{ClientConfig, config_file_path, load_config};
pub use error::{Result, ZegamiError};
pub use http::{RequestAuth, Session, TokenEndpointAuth};
