//! Suite configuration subsystem.
//!
//! # Data Flow
//! ```text
//! suite file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every error collected)
//!     → EngineConfig (validated, immutable)
//!     → resolve_operations() → OperationMetadata per test operation
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal suites
//! - Validation separates syntactic (serde) from semantic checks
//! - Durations are written in milliseconds

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::EngineConfig;
pub use schema::ObservabilityConfig;
pub use schema::OperationConfig;
pub use schema::PerformanceConfig;
pub use schema::RetryConfig;
pub use schema::SecurityConfig;
pub use schema::SecurityRequirementsConfig;
