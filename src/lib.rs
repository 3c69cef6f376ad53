pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{http::VendorClient, storage::LocalStorage};
pub use app::pipelines::{AuditPipeline, TokenPipeline};
pub use config::{AuditJobConfig, ConnectionConfig, Profile, TokenJobConfig};
pub use crate::core::etl::EtlEngine;
pub use utils::error::{Result, TrustkitError};
