//! Populating the data directory with the catalog files.
//!
//! The retrieval layer only assumes that *something* drops
//! `fields_observed.dat` and the two `stats-*.fits` files into the data
//! directory. That something is a [`Provisioner`]; the bundled
//! implementation fetches the files over HTTP Basic Auth (the catalog
//! server is password-protected) and is compiled in with the `provision`
//! feature. Credentials are supplied by the caller; nothing here prompts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::data_dir::OBSERVED_FILENAME;

/// The three files a populated data directory holds.
pub const CATALOG_FILES: [&str; 3] = [OBSERVED_FILENAME, "stats-red.fits", "stats-blu.fits"];

pub const MANIFEST_FILENAME: &str = "provision_manifest.json";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedFile {
    pub name: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub files: Vec<ProvisionedFile>,
}

/// Something that can populate a data directory with [`CATALOG_FILES`].
pub trait Provisioner {
    fn provision(&self, data_dir: &Path) -> Result<ProvisionReport>;
}

/// Records what a provisioning run placed in the directory.
pub fn write_manifest(data_dir: &Path, report: &ProvisionReport) -> Result<()> {
    let path = data_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// The manifest of the last provisioning run, if one exists.
pub fn read_manifest(data_dir: &Path) -> Result<Option<ProvisionReport>> {
    let path = data_dir.join(MANIFEST_FILENAME);
    if !path.exists() {
        return Ok(None);
    }
    let json =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let report = serde_json::from_str(&json)
        .with_context(|| format!("malformed manifest {}", path.display()))?;
    Ok(Some(report))
}

#[cfg(feature = "provision")]
pub use http::HttpProvisioner;

#[cfg(feature = "provision")]
mod http {
    use super::*;

    /// Fetches the catalog files from a password-protected server.
    pub struct HttpProvisioner {
        base_url: String,
        credentials: Credentials,
        client: reqwest::blocking::Client,
    }

    impl HttpProvisioner {
        pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
            Self {
                base_url: base_url.into(),
                credentials,
                client: reqwest::blocking::Client::new(),
            }
        }

        fn fetch(&self, name: &str) -> Result<Vec<u8>> {
            let url = format!("{}/{}", self.base_url.trim_end_matches('/'), name);
            let response = self
                .client
                .get(&url)
                .basic_auth(&self.credentials.username, Some(&self.credentials.password))
                .send()
                .with_context(|| format!("failed to connect: {url}"))?;
            if !response.status().is_success() {
                anyhow::bail!(
                    "download of {name} failed with status {}; check the username/password",
                    response.status()
                );
            }
            let body = response
                .bytes()
                .with_context(|| format!("failed to read response for {name}"))?;
            Ok(body.to_vec())
        }
    }

    impl Provisioner for HttpProvisioner {
        fn provision(&self, data_dir: &Path) -> Result<ProvisionReport> {
            fs::create_dir_all(data_dir)
                .with_context(|| format!("failed to create {}", data_dir.display()))?;
            let mut files = Vec::with_capacity(CATALOG_FILES.len());
            for name in CATALOG_FILES {
                let body = self.fetch(name)?;
                let dest = data_dir.join(name);
                fs::write(&dest, &body)
                    .with_context(|| format!("failed to write {}", dest.display()))?;
                files.push(ProvisionedFile {
                    name: name.to_string(),
                    bytes: body.len() as u64,
                });
            }
            let report = ProvisionReport { files };
            write_manifest(data_dir, &report)?;
            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Copies pre-staged files instead of talking to a server.
    struct DirProvisioner {
        source: std::path::PathBuf,
    }

    impl Provisioner for DirProvisioner {
        fn provision(&self, data_dir: &Path) -> Result<ProvisionReport> {
            fs::create_dir_all(data_dir)?;
            let mut files = Vec::new();
            for name in CATALOG_FILES {
                let body = fs::read(self.source.join(name))?;
                fs::write(data_dir.join(name), &body)?;
                files.push(ProvisionedFile {
                    name: name.to_string(),
                    bytes: body.len() as u64,
                });
            }
            let report = ProvisionReport { files };
            write_manifest(data_dir, &report)?;
            Ok(report)
        }
    }

    #[test]
    fn catalog_files_cover_the_three_shapes() {
        assert_eq!(
            CATALOG_FILES,
            ["fields_observed.dat", "stats-red.fits", "stats-blu.fits"]
        );
    }

    #[test]
    fn manifest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let report = ProvisionReport {
            files: vec![
                ProvisionedFile {
                    name: "fields_observed.dat".to_string(),
                    bytes: 412,
                },
                ProvisionedFile {
                    name: "stats-red.fits".to_string(),
                    bytes: 8640,
                },
            ],
        };
        write_manifest(dir.path(), &report).unwrap();
        let read_back = read_manifest(dir.path()).unwrap().unwrap();
        assert_eq!(read_back, report);
    }

    #[test]
    fn missing_manifest_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_manifest(dir.path()).unwrap(), None);
    }

    #[test]
    fn malformed_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILENAME), "not json").unwrap();
        assert!(read_manifest(dir.path()).is_err());
    }

    #[test]
    fn provisioner_populates_a_directory_through_the_trait() {
        let source = tempfile::tempdir().unwrap();
        for name in CATALOG_FILES {
            fs::write(source.path().join(name), name.as_bytes()).unwrap();
        }
        let dest = tempfile::tempdir().unwrap();
        let data_dir = dest.path().join("data");

        let provisioner: Box<dyn Provisioner> = Box::new(DirProvisioner {
            source: source.path().to_path_buf(),
        });
        let report = provisioner.provision(&data_dir).unwrap();

        assert_eq!(report.files.len(), 3);
        for file in &report.files {
            assert_eq!(file.bytes, file.name.len() as u64);
            assert!(data_dir.join(&file.name).exists());
        }
        assert_eq!(read_manifest(&data_dir).unwrap(), Some(report));
    }
}
