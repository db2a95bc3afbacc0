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

#[macro_export]
/// The `set_once!` macro handles a string sub-directive that may only be set once.
///
/// The dispenser must be positioned on the sub-directive name. The macro:
/// - Returns the dispenser's "already set" error if the target is non-empty
/// - Stores the next argument on the line, if any, into the target
/// - Returns the dispenser's argument error if a second argument follows
///
/// # Usage
///
/// ```rust,ignore
/// set_once!(d, self.config.login, "login");
/// ```
///
/// Where:
/// - `d` is a `Dispenser` (anything with `next_arg`, `val`, `already_set` and `arg_err`)
/// - the target is a `String` place expression
/// - the literal names the field in the error message
///
/// Must be used inside a function returning `Result<_, ConfigError>`.
macro_rules! set_once {
    ($d:expr, $target:expr, $field:literal) => {{
        if !$target.is_empty() {
            return Err($d.already_set($field));
        }
        if $d.next_arg() {
            $target = $d.val().to_string();
        }
        if $d.next_arg() {
            return Err($d.arg_err());
        }
    }};
}

#[macro_export]
/// The `set_parsed!` macro handles an optional, typed sub-directive.
///
/// `seen` is a `bool` place tracking whether the sub-directive already
/// appeared; a repeat returns the dispenser's "already set" error naming
/// `field`. The single argument is handed to `parser`, a
/// `Fn(&str) -> Option<T>`. `Some` is stored into the target; `None` leaves
/// the target untouched and emits a `tracing` warning naming the directive
/// and the rejected value. A second argument on the line is an argument
/// error.
///
/// # Usage
///
/// ```rust,ignore
/// let mut seen_debug_level = false;
/// set_parsed!(d, self.config.debug_level, parse_debug_level, seen_debug_level, "debug level");
/// ```
///
/// The calling crate must depend on `tracing`.
macro_rules! set_parsed {
    ($d:expr, $target:expr, $parser:expr, $seen:expr, $field:literal) => {{
        if $seen {
            return Err($d.already_set($field));
        }
        $seen = true;
        let directive = $d.val().to_string();
        if $d.next_arg() {
            match ($parser)($d.val()) {
                Some(value) => $target = value,
                None => ::tracing::warn!(
                    directive = %directive,
                    value = %$d.val(),
                    line = $d.line(),
                    "Ignoring invalid value for subdirective"
                ),
            }
        }
        if $d.next_arg() {
            return Err($d.arg_err());
        }
    }};
}
