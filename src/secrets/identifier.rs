// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Addressable identifiers (`d` tags)
//!
//! A (project, environment) pair is addressed as `<projectId>|<environmentSlug>`.
//! Both components are non-empty and contain no `|`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::IdentifierError;

pub const SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    pub project_id: String,
    pub environment: String,
}

fn check_component(name: &str, value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Malformed {
            reason: format!("{} is empty", name),
        });
    }
    if value.contains(SEPARATOR) {
        return Err(IdentifierError::Malformed {
            reason: format!("{} contains '{}'", name, SEPARATOR),
        });
    }
    Ok(())
}

impl Identifier {
    pub fn new(project_id: impl Into<String>, environment: impl Into<String>) -> Result<Self, IdentifierError> {
        let project_id = project_id.into();
        let environment = environment.into();
        check_component("project id", &project_id)?;
        check_component("environment", &environment)?;
        Ok(Self {
            project_id,
            environment,
        })
    }

    /// Parse a `d` tag; `None` unless it splits into exactly two non-empty parts
    pub fn parse(d_tag: &str) -> Option<Self> {
        let mut parts = d_tag.split(SEPARATOR);
        let project_id = parts.next()?;
        let environment = parts.next()?;
        if parts.next().is_some() || project_id.is_empty() || environment.is_empty() {
            return None;
        }
        Some(Self {
            project_id: project_id.to_string(),
            environment: environment.to_string(),
        })
    }

    pub fn as_d_tag(&self) -> String {
        format!("{}{}{}", self.project_id, SEPARATOR, self.environment)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.project_id, SEPARATOR, self.environment)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| IdentifierError::Malformed {
            reason: format!("'{}' is not <projectId>|<environment>", s),
        })
    }
}

/// Join a project and environment into a `d` tag
pub fn make_identifier(project_id: &str, environment: &str) -> Result<String, IdentifierError> {
    Identifier::new(project_id, environment).map(|id| id.as_d_tag())
}

/// Split a `d` tag; never panics, returns `None` for anything malformed
pub fn parse_identifier(d_tag: &str) -> Option<(String, String)> {
    Identifier::parse(d_tag).map(|id| (id.project_id, id.environment))
}
