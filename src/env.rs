// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolve configuration variables from the environment.
//!
//! Configuration comes from two places: the process environment and a `.env` file in the working
//! directory.  [`Environment`] combines both; the process environment always wins, i.e. a `.env`
//! file never overrides a variable which is already set, not even if it is set to an empty value.
//!
//! Empty values count as unset, so `ACP_TOKEN=` in the environment means there is no token.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Variables parsed from a `.env` file.
///
/// Parsing follows the dotenv conventions as implemented by [`dotenvy`]: quoted values, inline
/// comments, `export` prefixes, multi-line values in quotes, and `$VAR` substitution.  The
/// variables stay in memory; they are never written to the process environment.
///
/// Invalid lines are skipped with a warning; later assignments override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotEnv {
    vars: HashMap<String, String>,
}

static_assertions::assert_impl_all!(DotEnv: Send, Sync);

impl DotEnv {
    /// No variables at all.
    pub fn empty() -> Self {
        Self::default()
    }

    fn collect_iter<R: Read>(iter: dotenvy::Iter<R>) -> dotenvy::Result<Self> {
        let mut vars = HashMap::new();
        for item in iter {
            match item {
                Ok((key, value)) => {
                    vars.insert(key, value);
                }
                // A failed read repeats forever, so stop at the first one.
                Err(error @ dotenvy::Error::Io(_)) => return Err(error),
                Err(error) => log::warn!("Skipping invalid entry in .env file: {}", error),
            }
        }
        Ok(Self { vars })
    }

    /// Parse the contents of a `.env` file.
    pub fn parse<S: AsRef<str>>(contents: S) -> Self {
        Self::collect_iter(dotenvy::from_read_iter(contents.as_ref().as_bytes())).unwrap_or_else(
            |error| {
                log::warn!("Failed to parse .env contents: {}", error);
                Self::empty()
            },
        )
    }

    /// Read and parse the `.env` file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> dotenvy::Result<Self> {
        dotenvy::from_path_iter(path).and_then(Self::collect_iter)
    }

    /// Load `.env` from the current working directory.
    ///
    /// Return empty variables if there is no such file.  If the file exists but cannot be read,
    /// log a warning and return empty variables as well.
    pub fn from_working_dir() -> Self {
        let path = match std::env::current_dir() {
            Ok(dir) => dir.join(".env"),
            Err(error) => {
                log::warn!("Cannot determine working directory, skipping .env: {}", error);
                return Self::empty();
            }
        };
        match Self::from_path(&path) {
            Ok(dotenv) => {
                log::debug!("Loaded {} variables from {}", dotenv.len(), path.display());
                dotenv
            }
            Err(error) if error.not_found() => Self::empty(),
            Err(error) => {
                log::warn!("Failed to read {}, skipping: {}", path.display(), error);
                Self::empty()
            }
        }
    }

    /// Get the value of `var`, if set and not empty.
    pub fn get(&self, var: &str) -> Option<&str> {
        self.vars
            .get(var)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether there are no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn lookup(var: &str) -> Option<String> {
    std::env::var_os(var).and_then(|v| {
        v.to_str().map(ToOwned::to_owned).or_else(|| {
            log::warn!("Variable ${} does not contain valid unicode, skipping", var);
            None
        })
    })
}

/// Configuration variables from the process environment and a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    dotenv: DotEnv,
}

static_assertions::assert_impl_all!(Environment: Send, Sync);

impl Environment {
    /// Look at the process environment only.
    pub fn process_only() -> Self {
        Self::with_dotenv(DotEnv::empty())
    }

    /// Look at the process environment, then at the given `.env` variables.
    pub fn with_dotenv(dotenv: DotEnv) -> Self {
        Self { dotenv }
    }

    /// Look at the process environment, then at `.env` in the current working directory.
    ///
    /// The `.env` file is read once, right now.
    pub fn from_working_dir() -> Self {
        Self::with_dotenv(DotEnv::from_working_dir())
    }

    /// The `.env` variables consulted after the process environment.
    pub fn dotenv(&self) -> &DotEnv {
        &self.dotenv
    }

    /// Get the value of `var`.
    ///
    /// If `var` is set in the process environment return its value, or `None` if the value is
    /// empty.  Otherwise return the non-empty value from the `.env` file, if any.  Variables with
    /// invalid unicode in the process environment are skipped, as if they were not set.
    pub fn var(&self, var: &str) -> Option<String> {
        match lookup(var) {
            Some(value) => Some(value).filter(|v| !v.is_empty()),
            None => self.dotenv.get(var).map(ToOwned::to_owned),
        }
    }
}
