//! Security validation subsystem.
//!
//! # Data Flow
//! ```text
//! Test operation body:
//!     → validator.rs validate_input
//!         → normalize.rs (percent + HTML entity decoding to a fixpoint)
//!         → signatures.rs (per-type input tables)
//!     → validator.rs validate_response
//!         → signatures.rs (reflected payloads, leakage, missing CSRF token)
//!     → auth.rs (role membership + bearer token shape)
//! ```
//!
//! # Design Decisions
//! - Stateless: signature tables are compiled once and never mutated
//! - Input is decoded before matching; response bodies are matched raw,
//!   since an encoded echo is a safe echo
//! - Requesting no checks is vacuously valid

pub mod auth;
pub mod normalize;
pub mod signatures;
pub mod types;
pub mod validator;

pub use auth::{AuthViolation, SecurityAuthValidation};
pub use types::{OwaspCategory, SecurityFinding, SecurityType, Severity};
pub use validator::{SecurityInputValidation, SecurityResponseValidation, SecurityValidator};
