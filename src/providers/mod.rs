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

//! DNS provider modules
//!
//! Available providers:
//! - [`TransipProvider`] - login and private key, with client tuning options
//! - [`TransipLegacyProvider`] - account name and private key file

mod transip;
mod transip_legacy;

pub use transip::{TRANSIP_MODULE, TransipConfig, TransipProvider};
pub use transip_legacy::{TRANSIP_LEGACY_MODULE, TransipLegacyConfig, TransipLegacyProvider};

use crate::error::RegistryError;
use crate::module::ModuleRegistry;

/// Registers every provider module of this crate.
///
/// Call once while the host initialises its registry.
pub fn register_all(registry: &mut ModuleRegistry) -> Result<(), RegistryError> {
    registry.register_module::<TransipProvider>()?;
    registry.register_module::<TransipLegacyProvider>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleId;

    #[test]
    fn test_register_all() {
        let mut registry = ModuleRegistry::new();
        register_all(&mut registry).unwrap();
        let ids: Vec<ModuleId> = registry.ids().collect();
        assert_eq!(ids, vec![TRANSIP_MODULE, TRANSIP_LEGACY_MODULE]);

        let module = registry.instantiate("dns.providers.transip").unwrap();
        assert_eq!(module.id(), TRANSIP_MODULE);
        assert!(module.as_any().downcast_ref::<TransipProvider>().is_some());
    }

    #[test]
    fn test_register_twice_fails() {
        let mut registry = ModuleRegistry::new();
        register_all(&mut registry).unwrap();
        let err = register_all(&mut registry).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("dns.providers.transip".to_string()));
    }
}
