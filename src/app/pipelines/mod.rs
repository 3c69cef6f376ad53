pub mod audit_pipeline;
pub mod token_pipeline;

pub use audit_pipeline::AuditPipeline;
pub use token_pipeline::TokenPipeline;
