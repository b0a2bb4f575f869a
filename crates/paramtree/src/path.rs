//! Parameter names and their path-component form.
//!
//! A name like `/app/db/port` is the canonical string of the path
//! `["app", "db", "port"]`. Components are never empty and never contain `/`;
//! names with empty segments (`/a//b`, `/a/`) are rejected rather than
//! collapsed, so every accepted name maps back to exactly one string.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Separator between path components.
pub const SEPARATOR: char = '/';

/// Validated, non-empty sequence of path components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterPath {
    components: Vec<String>,
}

impl ParameterPath {
    /// Build a path from components, validating each one.
    pub fn new<I, S>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let components: Vec<String> = components.into_iter().map(Into::into).collect();
        if components.is_empty() {
            return Err(Error::malformed("", "path has no components"));
        }
        for component in &components {
            validate_component(component, &components)?;
        }
        Ok(Self { components })
    }

    /// Parse a parameter name. A single leading `/` is optional.
    pub fn parse(name: &str) -> Result<Self> {
        let trimmed = name.strip_prefix(SEPARATOR).unwrap_or(name);
        if trimmed.is_empty() {
            return Err(Error::malformed(name, "path has no components"));
        }
        let components: Vec<String> = trimmed.split(SEPARATOR).map(str::to_string).collect();
        if components.iter().any(String::is_empty) {
            return Err(Error::malformed(name, "empty path component"));
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Canonical `/a/b/c` form.
    pub fn to_name(&self) -> String {
        let mut name = String::new();
        for component in &self.components {
            name.push(SEPARATOR);
            name.push_str(component);
        }
        name
    }

    /// Append components from a relative path.
    pub fn join<I, S>(&self, rest: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut components = self.components.clone();
        components.extend(rest.into_iter().map(Into::into));
        Self::new(components)
    }

    pub fn starts_with(&self, prefix: &ParameterPath) -> bool {
        self.components.starts_with(&prefix.components)
    }

    /// Components below `prefix`, or `None` when this path is not strictly below it.
    pub fn strip_prefix(&self, prefix: &ParameterPath) -> Option<&[String]> {
        if self.len() > prefix.len() && self.starts_with(prefix) {
            Some(&self.components[prefix.len()..])
        } else {
            None
        }
    }
}

fn validate_component(component: &str, all: &[String]) -> Result<()> {
    if component.is_empty() {
        return Err(Error::malformed(describe(all), "empty path component"));
    }
    if component.contains(SEPARATOR) {
        return Err(Error::malformed(
            describe(all),
            format!("component '{}' contains '/'", component),
        ));
    }
    Ok(())
}

fn describe(components: &[String]) -> String {
    format!("/{}", components.join("/"))
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in &self.components {
            write!(f, "{}{}", SEPARATOR, component)?;
        }
        Ok(())
    }
}

impl FromStr for ParameterPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
