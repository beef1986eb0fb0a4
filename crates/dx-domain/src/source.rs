use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("unsupported locator scheme `{0}` (expected github:, gitlab:, git+https:, git+ssh: or path:)")]
    UnsupportedScheme(String),
    #[error("locator is missing the repository (expected <owner>/<repo>)")]
    MissingRepository,
    #[error("locator does not pin a revision")]
    MissingRevision,
    #[error("invalid repository url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Forge {
    Github,
    Gitlab,
}

impl Forge {
    fn scheme(self) -> &'static str {
        match self {
            Forge::Github => "github",
            Forge::Gitlab => "gitlab",
        }
    }
}

/// Repository + revision pair naming one immutable package snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocator {
    Forge {
        forge: Forge,
        owner: String,
        repo: String,
        revision: String,
    },
    Git {
        url: Url,
        revision: String,
    },
    Path {
        path: PathBuf,
    },
}

impl SourceLocator {
    #[must_use]
    pub fn revision(&self) -> String {
        match self {
            SourceLocator::Forge { revision, .. } | SourceLocator::Git { revision, .. } => {
                revision.clone()
            }
            SourceLocator::Path { path } => path.display().to_string(),
        }
    }

    #[must_use]
    pub fn repository(&self) -> String {
        match self {
            SourceLocator::Forge {
                forge, owner, repo, ..
            } => format!("{}:{owner}/{repo}", forge.scheme()),
            SourceLocator::Git { url, .. } => {
                let mut bare = url.clone();
                bare.set_query(None);
                format!("git+{bare}")
            }
            SourceLocator::Path { path } => format!("path:{}", path.display()),
        }
    }
}

impl FromStr for SourceLocator {
    type Err = LocatorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let Some((scheme, rest)) = raw.split_once(':') else {
            return Err(LocatorError::UnsupportedScheme(raw.to_string()));
        };
        match scheme {
            "github" => parse_forge(Forge::Github, rest),
            "gitlab" => parse_forge(Forge::Gitlab, rest),
            "git+https" | "git+ssh" | "git+http" | "git+file" => parse_git(raw),
            "path" => {
                if rest.trim().is_empty() {
                    return Err(LocatorError::MissingRepository);
                }
                Ok(SourceLocator::Path {
                    path: PathBuf::from(rest),
                })
            }
            other => Err(LocatorError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn parse_forge(forge: Forge, rest: &str) -> Result<SourceLocator, LocatorError> {
    let mut parts = rest.splitn(3, '/');
    let owner = parts.next().unwrap_or_default().trim();
    let repo = parts.next().unwrap_or_default().trim();
    if owner.is_empty() || repo.is_empty() {
        return Err(LocatorError::MissingRepository);
    }
    let revision = parts.next().unwrap_or_default().trim().trim_matches('/');
    if revision.is_empty() {
        return Err(LocatorError::MissingRevision);
    }
    Ok(SourceLocator::Forge {
        forge,
        owner: owner.to_string(),
        repo: repo.to_string(),
        revision: revision.to_string(),
    })
}

fn parse_git(raw: &str) -> Result<SourceLocator, LocatorError> {
    let url = Url::parse(raw.trim_start_matches("git+"))?;
    if url.path().trim_matches('/').is_empty() {
        return Err(LocatorError::MissingRepository);
    }
    // `rev` pins a commit and wins over a branch/tag `ref`.
    let mut reference = None;
    let mut commit = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "rev" if !value.is_empty() => commit = Some(value.into_owned()),
            "ref" if !value.is_empty() => reference = Some(value.into_owned()),
            _ => {}
        }
    }
    let revision = commit.or(reference).ok_or(LocatorError::MissingRevision)?;
    Ok(SourceLocator::Git { url, revision })
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Forge {
                forge,
                owner,
                repo,
                revision,
            } => write!(f, "{}:{owner}/{repo}/{revision}", forge.scheme()),
            SourceLocator::Git { url, .. } => write!(f, "git+{url}"),
            SourceLocator::Path { path } => write!(f, "path:{}", path.display()),
        }
    }
}

impl Serialize for SourceLocator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A named input of the descriptor: the upstream snapshot packages come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageSource {
    pub name: String,
    pub locator: SourceLocator,
}

impl PackageSource {
    /// # Errors
    /// Returns an error when the locator is not a repository + revision pair.
    pub fn new(name: impl Into<String>, locator: &str) -> Result<Self, LocatorError> {
        Ok(Self {
            name: name.into(),
            locator: locator.parse()?,
        })
    }
}
