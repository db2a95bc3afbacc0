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

//! Module identity, lifecycle hooks and the registry the host loads
//! modules from.

use std::any::Any;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::io;

use tracing::{debug, info};

use crate::client::RecordOperations;
use crate::config::{Dispenser, Replacer};
use crate::error::{ConfigError, Error, RegistryError};

/// Stable, dot-separated module identifier such as `dns.providers.transip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(&'static str);

impl ModuleId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Everything before the last dot (`dns.providers`).
    pub fn namespace(&self) -> &'static str {
        self.0.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// The last label (`transip`).
    pub fn name(&self) -> &'static str {
        self.0.rsplit_once('.').map_or(self.0, |(_, name)| name)
    }
}

impl Borrow<str> for ModuleId {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Registration metadata: identifier plus a factory for fresh instances.
#[derive(Clone, Copy)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub new: fn() -> Box<dyn DnsProviderModule>,
}

impl fmt::Debug for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInfo").field("id", &self.id).finish()
    }
}

/// Implemented by every module type the host can register.
pub trait Module {
    fn module_info() -> ModuleInfo;
}

/// One-time setup after configuration parsing.
pub trait Provisioner {
    fn provision(&mut self, ctx: &ProvisionContext) -> Result<(), ConfigError>;
}

/// Reads a module's configuration block from a token dispenser.
pub trait BlockUnmarshaler {
    fn unmarshal_block(&mut self, d: &mut Dispenser) -> Result<(), ConfigError>;
}

/// What the host needs from a DNS provider module.
pub trait DnsProviderModule: Provisioner + BlockUnmarshaler + fmt::Debug + Send + Sync {
    fn id(&self) -> ModuleId;

    /// Populates the configuration from the module's JSON form.
    fn load_json(&mut self, raw: &serde_json::Value) -> Result<(), ConfigError>;

    /// The module's configuration in JSON form.
    fn to_json(&self) -> Result<serde_json::Value, ConfigError>;

    /// Record operations, forwarded to the embedded provider client.
    fn records(&self) -> &dyn RecordOperations;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Everything a module may use while provisioning.
#[derive(Debug, Clone)]
pub struct ProvisionContext {
    replacer: Replacer,
    logger: ModuleLogger,
}

impl ProvisionContext {
    /// Context with the global placeholders and a logger for `module`.
    pub fn new(module: ModuleId) -> Self {
        Self::with_replacer(module, Replacer::new())
    }

    pub fn with_replacer(module: ModuleId, replacer: Replacer) -> Self {
        Self {
            replacer,
            logger: ModuleLogger::new(module),
        }
    }

    pub fn replacer(&self) -> &Replacer {
        &self.replacer
    }

    pub fn logger(&self) -> &ModuleLogger {
        &self.logger
    }

    /// Same placeholders, logger scoped to `module`.
    pub fn for_module(&self, module: ModuleId) -> Self {
        Self {
            replacer: self.replacer.clone(),
            logger: ModuleLogger::new(module),
        }
    }
}

/// Logger scoped to one module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleLogger {
    module: ModuleId,
}

impl ModuleLogger {
    pub fn new(module: ModuleId) -> Self {
        Self { module }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// A writer turning every written line into a `debug` event.
    pub fn writer(&self) -> LogWriter {
        LogWriter {
            module: self.module,
            pending: Vec::new(),
        }
    }
}

/// `io::Write` adapter over [`ModuleLogger`].
///
/// Output is split on newlines; a trailing partial line is emitted on flush
/// or drop.
#[derive(Debug)]
pub struct LogWriter {
    module: ModuleId,
    pending: Vec<u8>,
}

impl LogWriter {
    fn emit(&self, line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            debug!(target: "dns_provider_transip::client", module = %self.module, "{}", line);
        }
    }

    /// Bytes written but not yet emitted.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line[..pos]);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

/// Modules known to the host, keyed by id.
///
/// Filled during an explicit initialisation phase, see
/// [`crate::providers::register_all`].
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<ModuleId, ModuleInfo>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, info: ModuleInfo) -> Result<(), RegistryError> {
        if self.modules.contains_key(&info.id) {
            return Err(RegistryError::Duplicate(info.id.to_string()));
        }
        debug!(module = %info.id, "Registered module");
        self.modules.insert(info.id, info);
        Ok(())
    }

    pub fn register_module<M: Module>(&mut self) -> Result<(), RegistryError> {
        self.register(M::module_info())
    }

    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.keys().copied()
    }

    /// Creates a fresh, unconfigured instance of module `id`.
    pub fn instantiate(&self, id: &str) -> Result<Box<dyn DnsProviderModule>, RegistryError> {
        let info = self
            .get(id)
            .ok_or_else(|| RegistryError::Unknown(id.to_string()))?;
        Ok((info.new)())
    }

    /// Instantiates module `id`, reads its configuration block from `d`
    /// and provisions it.
    ///
    /// The logger handed to the module is always scoped to the loaded
    /// module, whatever module `ctx` was created for.
    pub fn load(
        &self,
        id: &str,
        d: &mut Dispenser,
        ctx: &ProvisionContext,
    ) -> Result<Box<dyn DnsProviderModule>, Error> {
        let mut module = self.instantiate(id)?;
        module.unmarshal_block(d)?;
        module.provision(&ctx.for_module(module.id()))?;
        info!(module = %module.id(), "Loaded DNS provider module");
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ProviderClient;
    use std::io::Write;

    #[test]
    fn test_module_id_parts() {
        let id = ModuleId::new("dns.providers.transip");
        assert_eq!(id.namespace(), "dns.providers");
        assert_eq!(id.name(), "transip");
        assert_eq!(id.to_string(), "dns.providers.transip");

        let bare = ModuleId::new("transip");
        assert_eq!(bare.namespace(), "");
        assert_eq!(bare.name(), "transip");
    }

    #[test]
    fn test_log_writer_buffers_partial_lines() {
        let logger = ModuleLogger::new(ModuleId::new("dns.providers.transip"));
        let mut writer = logger.writer();
        assert_eq!(writer.write(b"first line\nsecond").unwrap(), 17);
        assert_eq!(writer.pending(), b"second");
        writer.write_all(b" half\n").unwrap();
        assert!(writer.pending().is_empty());
        writer.write_all(b"tail").unwrap();
        writer.flush().unwrap();
        assert!(writer.pending().is_empty());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ModuleRegistry::new();
        assert_eq!(registry.ids().count(), 0);
        let err = registry.instantiate("dns.providers.transip").unwrap_err();
        assert_eq!(err, RegistryError::Unknown("dns.providers.transip".to_string()));
    }

    /// Module that remembers which logger it was provisioned with.
    #[derive(Debug)]
    struct LoggerRecorder {
        client: ProviderClient<()>,
        provisioned_for: Option<ModuleId>,
    }

    const RECORDER_MODULE: ModuleId = ModuleId::new("dns.providers.recorder");

    fn new_recorder() -> Box<dyn DnsProviderModule> {
        Box::new(LoggerRecorder {
            client: ProviderClient::new(RECORDER_MODULE, ()),
            provisioned_for: None,
        })
    }

    impl Provisioner for LoggerRecorder {
        fn provision(&mut self, ctx: &ProvisionContext) -> Result<(), ConfigError> {
            self.provisioned_for = Some(ctx.logger().module());
            Ok(())
        }
    }

    impl BlockUnmarshaler for LoggerRecorder {
        fn unmarshal_block(&mut self, d: &mut Dispenser) -> Result<(), ConfigError> {
            while d.next() {}
            Ok(())
        }
    }

    impl DnsProviderModule for LoggerRecorder {
        fn id(&self) -> ModuleId {
            RECORDER_MODULE
        }

        fn load_json(&mut self, _raw: &serde_json::Value) -> Result<(), ConfigError> {
            Ok(())
        }

        fn to_json(&self) -> Result<serde_json::Value, ConfigError> {
            Ok(serde_json::Value::Null)
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

    #[test]
    fn test_get_by_str() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleInfo {
                id: RECORDER_MODULE,
                new: new_recorder,
            })
            .unwrap();
        assert_eq!(
            registry.get("dns.providers.recorder").map(|info| info.id),
            Some(RECORDER_MODULE)
        );
        assert!(registry.get("dns.providers").is_none());
    }

    #[test]
    fn test_load_scopes_logger_to_loaded_module() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleInfo {
                id: RECORDER_MODULE,
                new: new_recorder,
            })
            .unwrap();

        let ctx = ProvisionContext::new(ModuleId::new("dns.providers.other"));
        let mut d = Dispenser::parse("Caddyfile", "recorder").unwrap();
        let module = registry.load("dns.providers.recorder", &mut d, &ctx).unwrap();

        let recorder = module.as_any().downcast_ref::<LoggerRecorder>().unwrap();
        assert_eq!(recorder.provisioned_for, Some(module.id()));
        assert_eq!(ctx.logger().module(), ModuleId::new("dns.providers.other"));
    }

    #[test]
    fn test_for_module_keeps_placeholders() {
        let mut repl = Replacer::empty();
        repl.set("zone", "example.com");
        let ctx = ProvisionContext::with_replacer(ModuleId::new("dns.providers.other"), repl);
        let scoped = ctx.for_module(RECORDER_MODULE);
        assert_eq!(scoped.logger().module(), RECORDER_MODULE);
        assert_eq!(scoped.replacer().replace_known("{zone}"), "example.com");
    }
}
