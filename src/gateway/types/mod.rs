//! Gateway types module
//!
//! ## Input Types
//! - [`ValidJson`]: JSON body extractor that rejects with the API error body
//!
//! ## Output Types
//! - [`ErrorResponse`]: Error body `{code, msg}`
//! - [`ApiError`]: Handler error with HTTP status and numeric code
//!
//! ## Submodules
//! - [`extract`]: Request extractors
//! - [`response`]: Response types and error codes

pub mod extract;
pub mod response;

pub use extract::ValidJson;
pub use response::{ApiError, ApiResult, ErrorResponse, StatusResponse, error_codes};
