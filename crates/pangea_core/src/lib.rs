//! # pangea_core
//!
//! Typed resource declarations for Terraform, validated up front and emitted
//! as Terraform JSON.
//!
//! This crate holds the machinery every resource type shares; concrete
//! resource types live in provider crates such as `pangea_aws`.
//!
//! ## Features
//!
//! - **Validation**: cross-field rules (exactly-one, mutually exclusive,
//!   mutually dependent, ranges, formats) reported all at once
//! - **Emission**: ordered Terraform JSON blocks that skip absent values
//! - **References**: `${type.name.attr}` handles with memoized computed properties
//! - **Synthesis**: provider, variable, resource and output blocks in one document
//! - **Templates**: YAML/JSON declaration files and `pangea.toml` configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use pangea_core::Synthesizer;
//!
//! let mut synth = Synthesizer::new();
//! let vpc = synth.declare("main", vpc_attributes)?;
//! synth.declare_value::<SubnetAttributes>("public", json!({
//!     "vpc_id": vpc.id(),
//!     "cidr_block": "10.0.1.0/24",
//! }))?;
//!
//! println!("{}", synth.to_json_pretty()?);
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod interpolation;
pub mod provider;
pub mod reference;
pub mod resource;
pub mod synthesizer;
pub mod template;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use block::Block;
pub use config::PangeaConfig;
pub use error::{PangeaError, PangeaResult};
pub use provider::{Output, OutputSpec, ProviderBlock, ProviderSettings, Variable};
pub use reference::{DeclaredResource, ResourceReference};
pub use resource::{ComputedProperties, ResourceAttributes};
pub use synthesizer::Synthesizer;
pub use template::{Declaration, Template};
pub use validation::{RuleKind, ValidationErrors, Validator, Violation};
