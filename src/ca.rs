// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Load the CA certificate the proxy uses to intercept TLS.
//!
//! The proxy terminates TLS and re-encrypts with certificates signed by its own CA, which it
//! installs at `~/.config/<slug>/ca.crt`.  Clients trust this CA in addition to the built-in
//! roots.

use std::path::{Path, PathBuf};

use reqwest::Certificate;

use crate::error::{Error, Result};
use crate::product::Product;

/// Check that the CA certificate of `product` exists at `path`.
///
/// Return the path, or [`Error::MissingCaCertificate`] if there is no such file.
pub fn locate_ca_certificate<P: Into<PathBuf>>(product: Product, path: P) -> Result<PathBuf> {
    let path = path.into();
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingCaCertificate { product, path })
    }
}

/// Load all PEM certificates from `path`.
///
/// The file may contain a bundle of several certificates.  Fail if the file cannot be read, or if
/// it holds no valid certificate at all.
pub fn load_ca_certificates<P: AsRef<Path>>(path: P) -> Result<Vec<Certificate>> {
    let path = path.as_ref();
    let pem = std::fs::read(path).map_err(|source| Error::ReadCaCertificate {
        path: path.to_path_buf(),
        source,
    })?;
    let certificates =
        Certificate::from_pem_bundle(&pem).map_err(|error| Error::InvalidCaCertificate {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
    if certificates.is_empty() {
        Err(Error::InvalidCaCertificate {
            path: path.to_path_buf(),
            reason: "no PEM certificate found".to_string(),
        })
    } else {
        log::debug!(
            "Loaded {} CA certificates from {}",
            certificates.len(),
            path.display()
        );
        Ok(certificates)
    }
}
