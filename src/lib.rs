//! IPv4 subnetting engine and practice-problem generator.
//!
//! - [`models`] - address arithmetic, [`models::Network`], address classes
//! - [`processing`] - classful and VLSM allocators, summary routes
//! - [`exercise`] - randomized exercises with canonical solutions
//! - [`feedback`] - step-by-step derivations for exercises
//! - [`api`] - string-level entry points
//! - [`output`] - JSON envelopes and terminal tables
//!
//! # Examples
//! ```
//! use subnet_trainer::models::Network;
//! use subnet_trainer::processing::{calculate_vlsm, VlsmRequirement};
//!
//! let base = Network::new("192.168.1.0/24").unwrap();
//! let reqs = [VlsmRequirement::new("A", 100), VlsmRequirement::new("B", 50)];
//! let result = calculate_vlsm(&base, &reqs);
//! assert_eq!(result.networks()[1].to_string(), "192.168.1.128/26");
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod exercise;
pub mod feedback;
pub mod models;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::SubnetError;
pub use exercise::{Difficulty, ExerciseKind, ExerciseProblem, GeneratorError};
pub use models::Network;
