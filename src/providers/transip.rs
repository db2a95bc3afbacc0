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
use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use dns_module_macros::{set_once, set_parsed};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::{ProviderClient, RecordBackend, RecordOperations};
use crate::config::{Dispenser, parse_bool};
use crate::error::ConfigError;
use crate::module::{
    BlockUnmarshaler, DnsProviderModule, Module, ModuleId, ModuleInfo, ProvisionContext,
    Provisioner,
};
use crate::utils::serde_utils::{is_false, is_zero};

pub const TRANSIP_MODULE: ModuleId = ModuleId::new("dns.providers.transip");

/// Settings read by the TransIP client.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransipConfig {
    /// TransIP account login
    #[serde(skip_serializing_if = "String::is_empty")]
    pub login: String,
    /// PEM private key used to request access tokens
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    /// Client debug verbosity, 0 (off) to 3
    #[serde(skip_serializing_if = "is_zero")]
    pub debug_level: u8,
    /// Request tokens that only work from the originating IP
    #[serde(skip_serializing_if = "is_false")]
    pub not_global_key: bool,
    /// Token lifetime, e.g. `30 minutes`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub expiration_time: String,
    /// Manage whole zones instead of individual records
    #[serde(skip_serializing_if = "is_false")]
    pub full_zone_control: bool,
}

impl TransipConfig {
    /// Interprets `expiration_time` as `<count> <unit>`.
    ///
    /// Units are seconds, minutes, hours, days and weeks, singular or
    /// plural. Returns `None` when unset or not in that form.
    pub fn expiration(&self) -> Option<Duration> {
        let mut parts = self.expiration_time.split_whitespace();
        let count: i64 = parts.next()?.parse().ok()?;
        let unit = parts.next()?;
        if parts.next().is_some() || count <= 0 {
            return None;
        }
        match unit.strip_suffix('s').unwrap_or(unit) {
            "second" => Duration::try_seconds(count),
            "minute" => Duration::try_minutes(count),
            "hour" => Duration::try_hours(count),
            "day" => Duration::try_days(count),
            "week" => Duration::try_weeks(count),
            _ => None,
        }
    }
}

impl fmt::Debug for TransipConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let private_key = if self.private_key.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("TransipConfig")
            .field("login", &self.login)
            .field("private_key", &private_key)
            .field("debug_level", &self.debug_level)
            .field("not_global_key", &self.not_global_key)
            .field("expiration_time", &self.expiration_time)
            .field("full_zone_control", &self.full_zone_control)
            .finish()
    }
}

/// Lets the host read and manipulate DNS records hosted at TransIP.
///
/// Syntax:
///
/// ```text
/// transip [<login> <private_key>] {
///     login <login>
///     private_key <private_key>
///     debug_level <1-3>
///     not_global_key <bool>
///     expiration_time <time>
///     full_zone_control <bool>
/// }
/// ```
#[derive(Debug)]
pub struct TransipProvider {
    client: ProviderClient<TransipConfig>,
}

impl TransipProvider {
    pub fn new() -> Self {
        Self::with_config(TransipConfig::default())
    }

    pub fn with_config(config: TransipConfig) -> Self {
        Self {
            client: ProviderClient::new(TRANSIP_MODULE, config),
        }
    }

    pub fn config(&self) -> &TransipConfig {
        self.client.config()
    }

    pub fn client(&self) -> &ProviderClient<TransipConfig> {
        &self.client
    }

    /// Attaches the TransIP API client that performs record operations.
    pub fn attach(&mut self, backend: Arc<dyn RecordBackend<TransipConfig>>) {
        self.client.attach(backend);
    }
}

impl Default for TransipProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn new_module() -> Box<dyn DnsProviderModule> {
    Box::new(TransipProvider::new())
}

impl Module for TransipProvider {
    fn module_info() -> ModuleInfo {
        ModuleInfo {
            id: TRANSIP_MODULE,
            new: new_module,
        }
    }
}

/// Levels 1 to 3; anything else leaves debugging as configured.
fn parse_debug_level(value: &str) -> Option<u8> {
    value.parse::<u8>().ok().filter(|level| (1..4).contains(level))
}

impl Provisioner for TransipProvider {
    /// Resolves placeholders in the credentials and, when debugging is on,
    /// routes client debug output to the module logger.
    fn provision(&mut self, ctx: &ProvisionContext) -> Result<(), ConfigError> {
        let repl = ctx.replacer();
        let config = self.client.config_mut();
        config.login = repl.replace_known(&config.login);
        config.private_key = repl.replace_known(&config.private_key);

        if !config.expiration_time.is_empty() && config.expiration().is_none() {
            warn!(
                module = %TRANSIP_MODULE,
                expiration_time = %config.expiration_time,
                "Expiration time is not of the form '<count> <unit>', passing it on unchanged"
            );
        }

        let debug_level = config.debug_level;
        if debug_level > 0 {
            self.client.set_debug_output(Box::new(ctx.logger().writer()));
        }

        debug!(
            module = %TRANSIP_MODULE,
            login = %self.config().login,
            debug_level,
            "Provisioned DNS provider"
        );
        Ok(())
    }
}

impl BlockUnmarshaler for TransipProvider {
    fn unmarshal_block(&mut self, d: &mut Dispenser) -> Result<(), ConfigError> {
        let config = self.client.config_mut();
        let mut seen_debug_level = false;
        let mut seen_not_global_key = false;
        let mut seen_full_zone_control = false;
        while d.next() {
            if d.next_arg() {
                config.login = d.val().to_string();
            }
            if d.next_arg() {
                config.private_key = d.val().to_string();
            }
            if d.next_arg() {
                return Err(d.arg_err());
            }
            let nesting = d.nesting();
            while d.next_block(nesting) {
                match d.val() {
                    "login" => set_once!(d, config.login, "login"),
                    "private_key" => set_once!(d, config.private_key, "private key"),
                    "debug_level" => set_parsed!(
                        d,
                        config.debug_level,
                        parse_debug_level,
                        seen_debug_level,
                        "debug level"
                    ),
                    "not_global_key" => set_parsed!(
                        d,
                        config.not_global_key,
                        parse_bool,
                        seen_not_global_key,
                        "not global key"
                    ),
                    "expiration_time" => {
                        set_once!(d, config.expiration_time, "expiration time")
                    }
                    "full_zone_control" => set_parsed!(
                        d,
                        config.full_zone_control,
                        parse_bool,
                        seen_full_zone_control,
                        "full zone control"
                    ),
                    _ => return Err(d.unrecognized()),
                }
            }
        }
        if config.login.is_empty() {
            return Err(d.missing("login"));
        }
        if config.private_key.is_empty() {
            return Err(d.missing("private key"));
        }
        Ok(())
    }
}

impl DnsProviderModule for TransipProvider {
    fn id(&self) -> ModuleId {
        TRANSIP_MODULE
    }

    fn load_json(&mut self, raw: &serde_json::Value) -> Result<(), ConfigError> {
        *self.client.config_mut() = TransipConfig::deserialize(raw)?;
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
