use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("package names must be non-empty")]
pub struct EmptyPackageName;

/// Opaque attribute name of a package inside a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// # Errors
    /// Returns [`EmptyPackageName`] when the name is blank.
    pub fn new(raw: &str) -> Result<Self, EmptyPackageName> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmptyPackageName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of package names wanted in the shell. Declaration order is not kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolRequest {
    names: BTreeSet<PackageName>,
}

impl ToolRequest {
    /// Builds a request from raw names, collapsing duplicates.
    ///
    /// # Errors
    /// Returns [`EmptyPackageName`] if any name is blank.
    pub fn from_names<I, S>(names: I) -> Result<Self, EmptyPackageName>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| PackageName::new(name.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { names })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageName> {
        self.names.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<PackageName> for ToolRequest {
    fn from_iter<I: IntoIterator<Item = PackageName>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ToolRequest {
    type Item = &'a PackageName;
    type IntoIter = std::collections::btree_set::Iter<'a, PackageName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
