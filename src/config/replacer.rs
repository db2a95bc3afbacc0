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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;

/// Looks up the value of a placeholder key.
pub type ReplacementFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Late-bound placeholder substitution over strings.
///
/// Placeholders have the form `{key}`. `\{` and `\}` produce literal braces.
#[derive(Clone)]
pub struct Replacer {
    static_values: HashMap<String, String>,
    providers: Vec<ReplacementFn>,
}

impl Replacer {
    /// Creates a replacer with the global providers (`env.*`, `system.*`, `time.now*`).
    pub fn new() -> Self {
        let mut replacer = Self::empty();
        replacer.add_provider(Arc::new(global_placeholder));
        replacer
    }

    /// Creates a replacer that knows no placeholders.
    pub fn empty() -> Self {
        Self {
            static_values: HashMap::new(),
            providers: Vec::new(),
        }
    }

    /// Sets a static value; static values take precedence over providers.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.static_values.insert(key.into(), value.into());
    }

    /// Adds a lookup function consulted after static values.
    pub fn add_provider(&mut self, provider: ReplacementFn) {
        self.providers.push(provider);
    }

    /// Resolves a single placeholder key.
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.static_values.get(key) {
            return Some(value.clone());
        }
        self.providers.iter().find_map(|provider| provider(key))
    }

    /// Replaces known placeholders; unknown ones are left as written.
    pub fn replace_known(&self, input: &str) -> String {
        self.replace(input, None)
    }

    /// Replaces every placeholder; unknown ones become `empty`.
    pub fn replace_all(&self, input: &str, empty: &str) -> String {
        self.replace(input, Some(empty))
    }

    fn replace(&self, input: &str, unknown: Option<&str>) -> String {
        if !input.contains('{') && !input.contains('\\') {
            return input.to_string();
        }

        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(pos) = rest.find(['{', '\\']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(escaped) = tail.strip_prefix('\\') {
                match escaped.chars().next() {
                    Some(c @ ('{' | '}')) => {
                        out.push(c);
                        rest = &escaped[1..];
                    }
                    _ => {
                        out.push('\\');
                        rest = escaped;
                    }
                }
                continue;
            }

            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                rest = "";
                break;
            };
            let key = &tail[1..end];
            if key.is_empty() || key.contains('{') {
                // Not a placeholder; emit the brace and keep scanning after it.
                out.push('{');
                rest = &tail[1..];
                continue;
            }
            match (self.get(key), unknown) {
                (Some(value), _) => out.push_str(&value),
                (None, Some(empty)) => out.push_str(empty),
                (None, None) => out.push_str(&tail[..=end]),
            }
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        out
    }
}

impl Default for Replacer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Replacer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replacer")
            .field("static_values", &self.static_values.keys().collect::<Vec<_>>())
            .field("providers", &self.providers.len())
            .finish()
    }
}

fn global_placeholder(key: &str) -> Option<String> {
    if let Some(name) = key.strip_prefix("env.") {
        return std::env::var(name).ok();
    }
    match key {
        "system.os" => Some(std::env::consts::OS.to_string()),
        "system.arch" => Some(std::env::consts::ARCH.to_string()),
        "system.hostname" => std::env::var("HOSTNAME").ok(),
        "time.now" => Some(Utc::now().to_rfc3339()),
        "time.now.unix" => Some(Utc::now().timestamp().to_string()),
        "time.now.unix_ms" => Some(Utc::now().timestamp_millis().to_string()),
        "time.now.year" => Some(Utc::now().format("%Y").to_string()),
        _ => None,
    }
}
