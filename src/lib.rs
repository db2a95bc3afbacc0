//! TransIP DNS provider module for reverse-proxy hosts
//!
//! The module holds the provider credentials, reads them from a
//! configuration block, resolves placeholders at provisioning time and
//! forwards record operations to an attached TransIP client.
//!
//! Supported features:
//! - Block syntax with positional or named credentials
//! - JSON module configuration
//! - Explicit module registry
//! - Client debug output routed to `tracing`
//!
//! # Example
//! ```
//! use dns_provider_transip::config::Dispenser;
//! use dns_provider_transip::module::{ModuleRegistry, ProvisionContext};
//! use dns_provider_transip::providers::{self, TRANSIP_MODULE};
//!
//! let mut registry = ModuleRegistry::new();
//! providers::register_all(&mut registry).unwrap();
//!
//! let mut d = Dispenser::parse("Caddyfile", "transip alice {env.TRANSIP_KEY}").unwrap();
//! let module = registry
//!     .load("dns.providers.transip", &mut d, &ProvisionContext::new(TRANSIP_MODULE))
//!     .unwrap();
//! assert_eq!(module.id(), TRANSIP_MODULE);
//! ```

// Copyright 2023 dns-provider-transip authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

pub mod client;
pub mod config;
pub mod error;
pub mod module;
pub mod providers;
pub(crate) mod utils;

pub use error::{ClientError, ConfigError, Error, RegistryError};
