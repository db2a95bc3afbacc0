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

use std::any::Any;
use std::sync::Arc;

use dns_module_macros::set_once;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{ProviderClient, RecordBackend, RecordOperations};
use crate::config::Dispenser;
use crate::error::ConfigError;
use crate::module::{
    BlockUnmarshaler, DnsProviderModule, Module, ModuleId, ModuleInfo, ProvisionContext,
    Provisioner,
};

pub const TRANSIP_LEGACY_MODULE: ModuleId = ModuleId::new("dns.providers.transip_legacy");

/// Settings read by the account-name based TransIP client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransipLegacyConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub account_name: String,
    /// Path of the PEM private key file
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_key_path: String,
}

/// TransIP provider configured by account name and private key file.
///
/// Syntax:
///
/// ```text
/// transip_legacy [<account_name> <private_key_path>] {
///     account_name <account_name>
///     private_key_path <private_key_path>
/// }
/// ```
#[derive(Debug)]
pub struct TransipLegacyProvider {
    client: ProviderClient<TransipLegacyConfig>,
}

impl TransipLegacyProvider {
    pub fn new() -> Self {
        Self {
            client: ProviderClient::new(TRANSIP_LEGACY_MODULE, TransipLegacyConfig::default()),
        }
    }

    pub fn config(&self) -> &TransipLegacyConfig {
        self.client.config()
    }

    pub fn attach(&mut self, backend: Arc<dyn RecordBackend<TransipLegacyConfig>>) {
        self.client.attach(backend);
    }
}

impl Default for TransipLegacyProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn new_module() -> Box<dyn DnsProviderModule> {
    Box::new(TransipLegacyProvider::new())
}

impl Module for TransipLegacyProvider {
    fn module_info() -> ModuleInfo {
        ModuleInfo {
            id: TRANSIP_LEGACY_MODULE,
            new: new_module,
        }
    }
}

impl Provisioner for TransipLegacyProvider {
    fn provision(&mut self, ctx: &ProvisionContext) -> Result<(), ConfigError> {
        let repl = ctx.replacer();
        let config = self.client.config_mut();
        config.account_name = repl.replace_known(&config.account_name);
        config.private_key_path = repl.replace_known(&config.private_key_path);
        debug!(
            module = %TRANSIP_LEGACY_MODULE,
            account_name = %config.account_name,
            "Provisioned DNS provider"
        );
        Ok(())
    }
}

impl BlockUnmarshaler for TransipLegacyProvider {
    fn unmarshal_block(&mut self, d: &mut Dispenser) -> Result<(), ConfigError> {
        let config = self.client.config_mut();
        while d.next() {
            if d.next_arg() {
                config.account_name = d.val().to_string();
            }
            if d.next_arg() {
                config.private_key_path = d.val().to_string();
            }
            if d.next_arg() {
                return Err(d.arg_err());
            }
            let nesting = d.nesting();
            while d.next_block(nesting) {
                match d.val() {
                    "account_name" => set_once!(d, config.account_name, "account name"),
                    "private_key_path" => {
                        set_once!(d, config.private_key_path, "private key path")
                    }
                    _ => return Err(d.unrecognized()),
                }
            }
        }
        if config.account_name.is_empty() {
            return Err(d.missing("account name"));
        }
        if config.private_key_path.is_empty() {
            return Err(d.missing("private key path"));
        }
        Ok(())
    }
}

impl DnsProviderModule for TransipLegacyProvider {
    fn id(&self) -> ModuleId {
        TRANSIP_LEGACY_MODULE
    }

    fn load_json(&mut self, raw: &serde_json::Value) -> Result<(), ConfigError> {
        *self.client.config_mut() = TransipLegacyConfig::deserialize(raw)?;
        Ok(())
    }

    fn to_json(&self) -> Result<serde_json::Value, ConfigError> {
        Ok(serde_json::to_value(self.config())?)
    }

    fn records(&self) -> &dyn RecordOperations {
        &self.client
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Replacer;
    use crate::error::ClientError;

    fn parse(input: &str) -> Result<TransipLegacyProvider, ConfigError> {
        let mut d = Dispenser::parse("Caddyfile", input)?;
        let mut provider = TransipLegacyProvider::new();
        provider.unmarshal_block(&mut d)?;
        Ok(provider)
    }

    #[test]
    fn test_positional_and_named_forms() {
        let provider = parse("transip_legacy alice /etc/key.pem").unwrap();
        assert_eq!(provider.config().account_name, "alice");
        assert_eq!(provider.config().private_key_path, "/etc/key.pem");

        let provider = parse(
            "transip_legacy {\n account_name alice\n private_key_path /etc/key.pem\n}",
        )
        .unwrap();
        assert_eq!(provider.config().account_name, "alice");
        assert_eq!(provider.config().private_key_path, "/etc/key.pem");
    }

    #[test]
    fn test_missing_fields() {
        let err = parse("transip_legacy {\n account_name alice\n}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "private key path", .. }));

        let err = parse("transip_legacy {\n private_key_path /k\n}").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "account name", .. }));
    }

    #[test]
    fn test_structural_errors() {
        let err = parse("transip_legacy alice /k {\n account_name bob\n}").unwrap_err();
        assert!(matches!(err, ConfigError::AlreadySet { field: "account name", .. }));

        let err = parse("transip_legacy alice /k {\n login bob\n}").unwrap_err();
        assert!(err.to_string().contains("unrecognized subdirective 'login'"));

        let err = parse("transip_legacy alice /k /extra").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedArgument { .. }));

        let err = parse("transip_legacy {\n private_key_path /a /b\n}").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedArgument { .. }));
    }

    #[test]
    fn test_named_fields_set_once() {
        let err = parse("transip_legacy alice /k {\n private_key_path /other\n}").unwrap_err();
        assert!(matches!(err, ConfigError::AlreadySet { field: "private key path", .. }));

        let err = parse("transip_legacy {\n account_name a\n account_name b\n}").unwrap_err();
        assert!(matches!(err, ConfigError::AlreadySet { field: "account name", ref location } if location.line == 3));
    }

    #[test]
    fn test_provision_resolves_placeholders() {
        let mut provider = parse("transip_legacy {account} {keys.dir}/transip.pem").unwrap();
        let mut repl = Replacer::empty();
        repl.set("account", "resolved-value");
        repl.set("keys.dir", "/etc/keys");
        provider
            .provision(&ProvisionContext::with_replacer(TRANSIP_LEGACY_MODULE, repl))
            .unwrap();
        assert_eq!(provider.config().account_name, "resolved-value");
        assert_eq!(provider.config().private_key_path, "/etc/keys/transip.pem");
    }

    #[tokio::test]
    async fn test_records_require_backend() {
        let provider = parse("transip_legacy alice /k").unwrap();
        let err = provider.records().get_records("example.com").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAttached { .. }));
    }
}
