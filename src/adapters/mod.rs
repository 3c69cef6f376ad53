// Adapters layer: concrete implementations for external systems
// (vendor HTTP API, local file storage, spreadsheet encoding).

pub mod http;
pub mod spreadsheet;
pub mod storage;
