//! Raw directive storage: an ordered multi-map from directive name to argument tuples.
//!
//! The out-of-scope configuration parser is responsible for populating this
//! structure from a configuration file; this crate only walks it.

use std::collections::HashMap;

/// An ordered multi-map from directive name to the list of argument tuples
/// supplied for that directive, in file-declaration order.
#[derive(Debug, Clone, Default)]
pub struct DirectiveTable {
    entries: HashMap<String, Vec<Vec<String>>>,
}

impl DirectiveTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one occurrence of `name` with the given arguments, preserving
    /// declaration order among occurrences of the same name.
    pub fn push(&mut self, name: &str, args: Vec<String>) {
        self.entries.entry(name.to_owned()).or_default().push(args);
    }

    /// Returns every occurrence of `name`, in declaration order.
    #[must_use]
    pub fn occurrences(&self, name: &str) -> &[Vec<String>] {
        self.entries.get(name).map_or(&[], Vec::as_slice)
    }

    /// Returns the first occurrence's first argument, if present.
    #[must_use]
    pub fn first_arg(&self, name: &str) -> Option<&str> {
        self.occurrences(name)
            .first()
            .and_then(|args| args.first())
            .map(String::as_str)
    }

    /// Parses the first occurrence's first argument as a directive boolean.
    ///
    /// Accepts the conventional FTP-daemon spellings: `on`/`off`,
    /// `yes`/`no`, `true`/`false`, case-insensitively.
    #[must_use]
    pub fn first_bool(&self, name: &str) -> Option<bool> {
        self.first_arg(name).and_then(parse_bool)
    }

    /// Parses the first occurrence's first argument as an integer.
    #[must_use]
    pub fn first_int(&self, name: &str) -> Option<i64> {
        self.first_arg(name).and_then(|s| s.parse().ok())
    }

    /// Returns whether `name` has at least one occurrence.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Parses a directive boolean token.
#[must_use]
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
