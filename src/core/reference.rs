//! core::reference
//!
//! Repository references and their parser.
//!
//! # Grammar
//!
//! ```text
//! reference := "https://" host "/" owner "/" name [".git"] ["@" revision]
//! ```
//!
//! Every component must be non-empty and no component may contain
//! whitespace. `host`, `owner` and `name` may not contain `/` or `@`; the
//! revision is everything after the first `@`.
//!
//! # Example
//!
//! ```
//! use reposync::core::reference::RepositoryReference;
//!
//! let reference: RepositoryReference = "https://github.com/rust-lang/log.git@0.4.22"
//!     .parse()
//!     .unwrap();
//! assert_eq!(reference.host(), "github.com");
//! assert_eq!(reference.owner(), "rust-lang");
//! assert_eq!(reference.name(), "log");
//! assert_eq!(reference.revision(), Some("0.4.22"));
//! assert_eq!(reference.url(), "https://github.com/rust-lang/log.git");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const SCHEME: &str = "https://";
const GIT_SUFFIX: &str = ".git";

/// Errors from parsing a repository reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input does not match the reference grammar.
    #[error("malformed repository reference '{input}': {reason}")]
    Malformed {
        /// The rejected input
        input: String,
        /// Which part of the grammar failed
        reason: String,
    },

    /// A component is present in position but empty.
    #[error("repository reference '{input}' has an empty {field}")]
    MissingField {
        /// The rejected input
        input: String,
        /// The empty component
        field: Field,
    },
}

impl ParseError {
    fn malformed(input: &str, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    fn missing(input: &str, field: Field) -> Self {
        ParseError::MissingField {
            input: input.to_string(),
            field,
        }
    }
}

/// Named components of a reference, used in [`ParseError::MissingField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Host,
    Owner,
    Name,
    Revision,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Host => write!(f, "host"),
            Field::Owner => write!(f, "owner"),
            Field::Name => write!(f, "name"),
            Field::Revision => write!(f, "revision"),
        }
    }
}

/// A parsed repository reference.
///
/// Construct with [`RepositoryReference::parse`] or `str::parse`. Once built
/// the host, owner and name are guaranteed non-empty, and `revision` is
/// `Some` only if the input carried an `@` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryReference {
    url: String,
    host: String,
    owner: String,
    name: String,
    revision: Option<String>,
}

impl RepositoryReference {
    /// Parse a reference string.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Malformed`] if the input does not match the grammar
    /// - [`ParseError::MissingField`] if a component is empty
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.chars().any(char::is_whitespace) {
            return Err(ParseError::malformed(input, "contains whitespace"));
        }

        let rest = input
            .strip_prefix(SCHEME)
            .ok_or_else(|| ParseError::malformed(input, "expected an https:// URL"))?;

        let (location, revision) = match rest.split_once('@') {
            Some((location, revision)) => {
                if revision.is_empty() {
                    return Err(ParseError::missing(input, Field::Revision));
                }
                (location, Some(revision.to_string()))
            }
            None => (rest, None),
        };

        let segments: Vec<&str> = location.split('/').collect();
        let [host, owner, raw_name] = segments.as_slice() else {
            return Err(ParseError::malformed(
                input,
                format!(
                    "expected <host>/<owner>/<name>, found {} path segment(s)",
                    segments.len()
                ),
            ));
        };

        let name = raw_name.strip_suffix(GIT_SUFFIX).unwrap_or(*raw_name);

        for (value, field) in [(*host, Field::Host), (*owner, Field::Owner), (name, Field::Name)] {
            if value.is_empty() {
                return Err(ParseError::missing(input, field));
            }
        }

        Ok(Self {
            url: format!("{}{}", SCHEME, location),
            host: host.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            revision,
        })
    }

    /// The clone URL: the input without its `@<revision>` suffix.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Hosting service host name (e.g. `github.com`).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Owning account or organization.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name, without any `.git` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pinned revision, if the input carried one.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Short identifier used in logs and reports: `owner/name`.
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryReference {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(revision) => write!(f, "{}@{}", self.url, revision),
            None => write!(f, "{}", self.url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse {
        use super::*;

        #[test]
        fn with_git_suffix_and_revision() {
            let r = RepositoryReference::parse("https://github.com/octocat/hello.git@v1.2").unwrap();
            assert_eq!(r.host(), "github.com");
            assert_eq!(r.owner(), "octocat");
            assert_eq!(r.name(), "hello");
            assert_eq!(r.revision(), Some("v1.2"));
            assert_eq!(r.url(), "https://github.com/octocat/hello.git");
        }

        #[test]
        fn without_git_suffix() {
            let r = RepositoryReference::parse("https://example.org/team/tool").unwrap();
            assert_eq!(r.name(), "tool");
            assert_eq!(r.revision(), None);
            assert_eq!(r.url(), "https://example.org/team/tool");
        }

        #[test]
        fn revision_is_everything_after_first_at() {
            let r = RepositoryReference::parse("https://h/o/n@feature@2").unwrap();
            assert_eq!(r.name(), "n");
            assert_eq!(r.revision(), Some("feature@2"));
        }

        #[test]
        fn revision_may_contain_slashes() {
            let r = RepositoryReference::parse("https://h/o/n.git@release/1.x").unwrap();
            assert_eq!(r.revision(), Some("release/1.x"));
        }

        #[test]
        fn wrong_scheme_is_malformed() {
            for input in [
                "http://github.com/o/n",
                "git@github.com:o/n.git",
                "github.com/o/n",
                "",
            ] {
                assert!(
                    matches!(
                        RepositoryReference::parse(input),
                        Err(ParseError::Malformed { .. })
                    ),
                    "{input}"
                );
            }
        }

        #[test]
        fn wrong_segment_count_is_malformed() {
            for input in [
                "https://github.com/o",
                "https://github.com",
                "https://gitlab.com/group/sub/n.git",
                "https://github.com/o/n/",
            ] {
                assert!(
                    matches!(
                        RepositoryReference::parse(input),
                        Err(ParseError::Malformed { .. })
                    ),
                    "{input}"
                );
            }
        }

        #[test]
        fn whitespace_is_malformed() {
            let err = RepositoryReference::parse("https://h/o/n @v1").unwrap_err();
            assert!(matches!(err, ParseError::Malformed { .. }));
        }

        #[test]
        fn empty_components_are_missing_fields() {
            let cases = [
                ("https:///o/n", Field::Host),
                ("https://h//n", Field::Owner),
                ("https://h/o/", Field::Name),
                ("https://h/o/.git", Field::Name),
                ("https://h/o/n@", Field::Revision),
            ];
            for (input, expected) in cases {
                match RepositoryReference::parse(input) {
                    Err(ParseError::MissingField { field, .. }) => {
                        assert_eq!(field, expected, "{input}")
                    }
                    other => panic!("{input}: expected missing {expected}, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn display_round_trips_input() {
        let input = "https://github.com/octocat/hello.git@abc123";
        let r: RepositoryReference = input.parse().unwrap();
        assert_eq!(r.to_string(), input);
    }

    #[test]
    fn identifier_is_owner_slash_name() {
        let r: RepositoryReference = "https://h/octocat/hello.git".parse().unwrap();
        assert_eq!(r.identifier(), "octocat/hello");
    }

    #[test]
    fn error_display() {
        let err = RepositoryReference::parse("https://h/o/n@").unwrap_err();
        assert_eq!(
            err.to_string(),
            "repository reference 'https://h/o/n@' has an empty revision"
        );
    }
}
