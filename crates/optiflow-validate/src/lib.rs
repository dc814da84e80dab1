//! # Optiflow Validate
//!
//! Pre-flight validation of configuration documents.
//!
//! Validation runs in two strictly ordered passes:
//! 1. **Structural**: the raw JSON form is checked against the document
//!    schema (required keys, types, enum membership, formats, ranges).
//! 2. **Business rules**: temporal ordering, protocol step order, and the
//!    rules of the document's domain (fleet, scheduling, inventory or
//!    production).
//!
//! Business rules never run on a structurally invalid document.
//!
//! ```ignore
//! let errors = ConfigValidator::new().validate(&doc);
//! if !errors.is_empty() {
//!     // do not run the protocol
//! }
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod rules;
pub mod schema;
pub mod validator;

mod domain;

pub use config::ValidatorConfig;
pub use error::{ValidationError, ValidationErrors};
pub use validator::ConfigValidator;
