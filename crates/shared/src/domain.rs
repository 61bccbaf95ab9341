use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! slug_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

slug_newtype!(OrgSlug);
slug_newtype!(ProjectSlug);

/// Identifies the project whose processing issues are shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub org: OrgSlug,
    pub project: ProjectSlug,
}

impl ProjectRef {
    pub fn new(org: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            org: OrgSlug::new(org),
            project: ProjectSlug::new(project),
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.project)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueScope {
    Native,
    Other,
}

impl IssueScope {
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "native" => Some(Self::Native),
            _ => Some(Self::Other),
        }
    }
}
