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

//! Delegation contract between a provider module and the external client
//! that talks to the DNS provider's API.
//!
//! The module only owns configuration. Record operations are forwarded to a
//! [`RecordBackend`] which receives the configuration by reference.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::module::ModuleId;
use crate::utils::serde_utils::is_zero;

/// A DNS resource record as exchanged with the provider client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Provider-assigned identifier, empty for records not yet created
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    /// Name relative to the zone, `@` for the apex
    pub name: String,
    pub value: String,
    /// Time to live in seconds, 0 for the provider default
    #[serde(default, skip_serializing_if = "is_zero")]
    pub ttl: u32,
}

impl Record {
    pub fn new(record_type: &str, name: &str, value: &str) -> Self {
        Self {
            id: String::new(),
            record_type: record_type.to_string(),
            name: name.to_string(),
            value: value.to_string(),
            ttl: 0,
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Record operations the host invokes on a provisioned module.
#[async_trait]
pub trait RecordOperations: Send + Sync {
    /// Lists all records in the zone.
    async fn get_records(&self, zone: &str) -> ClientResult<Vec<Record>>;

    /// Adds records to the zone and returns those that were added.
    async fn append_records(&self, zone: &str, records: &[Record]) -> ClientResult<Vec<Record>>;

    /// Creates or updates records and returns those that were set.
    async fn set_records(&self, zone: &str, records: &[Record]) -> ClientResult<Vec<Record>>;

    /// Removes records and returns those that were deleted.
    async fn delete_records(&self, zone: &str, records: &[Record]) -> ClientResult<Vec<Record>>;
}

/// The external provider client.
///
/// Implementations read their settings from [`ProviderClient::config`] and
/// may write diagnostics through [`ProviderClient::debug`].
#[async_trait]
pub trait RecordBackend<C>: Send + Sync {
    async fn get_records(&self, client: &ProviderClient<C>, zone: &str) -> ClientResult<Vec<Record>>;

    async fn append_records(
        &self,
        client: &ProviderClient<C>,
        zone: &str,
        records: &[Record],
    ) -> ClientResult<Vec<Record>>;

    async fn set_records(
        &self,
        client: &ProviderClient<C>,
        zone: &str,
        records: &[Record],
    ) -> ClientResult<Vec<Record>>;

    async fn delete_records(
        &self,
        client: &ProviderClient<C>,
        zone: &str,
        records: &[Record],
    ) -> ClientResult<Vec<Record>>;
}

/// Embedded provider client: configuration record, debug output slot and
/// the attached backend.
pub struct ProviderClient<C> {
    module: ModuleId,
    config: C,
    debug_output: Option<Mutex<Box<dyn Write + Send>>>,
    backend: Option<Arc<dyn RecordBackend<C>>>,
}

impl<C> ProviderClient<C> {
    pub fn new(module: ModuleId, config: C) -> Self {
        Self {
            module,
            config,
            debug_output: None,
            backend: None,
        }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut C {
        &mut self.config
    }

    /// Routes the client's debug output to `output`.
    pub fn set_debug_output(&mut self, output: Box<dyn Write + Send>) {
        self.debug_output = Some(Mutex::new(output));
    }

    pub fn has_debug_output(&self) -> bool {
        self.debug_output.is_some()
    }

    /// Writes one line of debug output, if a debug output is set.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        let Some(output) = &self.debug_output else {
            return;
        };
        if let Ok(mut output) = output.lock() {
            // Diagnostics only; a failing sink must not fail the operation.
            let _ = writeln!(output, "{}", args);
        }
    }

    /// Attaches the external client that performs record operations.
    pub fn attach(&mut self, backend: Arc<dyn RecordBackend<C>>) {
        self.backend = Some(backend);
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> ClientResult<Arc<dyn RecordBackend<C>>> {
        self.backend.clone().ok_or_else(|| ClientError::NotAttached {
            module: self.module.to_string(),
        })
    }
}

impl<C: fmt::Debug> fmt::Debug for ProviderClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("module", &self.module)
            .field("config", &self.config)
            .field("debug_output", &self.debug_output.is_some())
            .field("attached", &self.backend.is_some())
            .finish()
    }
}

#[async_trait]
impl<C: Send + Sync + 'static> RecordOperations for ProviderClient<C> {
    async fn get_records(&self, zone: &str) -> ClientResult<Vec<Record>> {
        let backend = self.backend()?;
        debug!(module = %self.module, zone, "Listing records");
        backend.get_records(self, zone).await
    }

    async fn append_records(&self, zone: &str, records: &[Record]) -> ClientResult<Vec<Record>> {
        let backend = self.backend()?;
        debug!(module = %self.module, zone, count = records.len(), "Appending records");
        backend.append_records(self, zone, records).await
    }

    async fn set_records(&self, zone: &str, records: &[Record]) -> ClientResult<Vec<Record>> {
        let backend = self.backend()?;
        debug!(module = %self.module, zone, count = records.len(), "Setting records");
        backend.set_records(self, zone, records).await
    }

    async fn delete_records(&self, zone: &str, records: &[Record]) -> ClientResult<Vec<Record>> {
        let backend = self.backend()?;
        debug!(module = %self.module, zone, count = records.len(), "Deleting records");
        backend.delete_records(self, zone, records).await
    }
}
