//! Static export and deployment
//!
//! [`export_static_page`] is a pure function of its input: identical (page, components)
//! always yield identical bytes. [`Deployer`] writes that output to the per-subdomain
//! directory layout the web server serves from.

use crate::model::{Component, Page, ROOT_SLUG};
use crate::rendering::{Composer, Mode};
use crate::{DeployConfig, Error, Result};
use log::info;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name of a deployed page inside its target directory.
pub const INDEX_FILE: &str = "index.html";

/// Render a published page to a complete HTML document.
///
/// Refuses unpublished pages with [`Error::UnpublishedExport`] before rendering anything,
/// and pages whose slug or subdomain would not map to a safe path with
/// [`Error::InvalidPage`].
pub fn export_static_page(composer: &Composer, page: &Page, components: &[Component]) -> Result<String> {
    if !page.is_published {
        return Err(Error::UnpublishedExport { page_id: page.id });
    }
    page.validate()?;
    Ok(composer.render_page(page, components, Mode::Static).to_html())
}

impl Composer {
    /// See [`export_static_page`].
    pub fn export_static_page(&self, page: &Page, components: &[Component]) -> Result<String> {
        export_static_page(self, page, components)
    }
}

/// Outcome of a [`Deployer::deploy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub path: PathBuf,
    pub bytes: usize,
    /// Hex SHA-256 of the written document
    pub sha256: String,
}

/// Writes exported pages under `output_dir`.
#[derive(Debug, Clone, Default)]
pub struct Deployer {
    config: DeployConfig,
}

impl Deployer {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// `<output_dir>/<subdomain>` for the root slug, `<output_dir>/<subdomain>/<slug>`
    /// otherwise.
    pub fn target_dir(&self, page: &Page) -> PathBuf {
        self.dir_for(&page.subdomain, &page.slug)
    }

    /// Export the page and write it to `<target_dir>/index.html`.
    pub fn deploy(&self, page: &Page, components: &[Component], composer: &Composer) -> Result<DeployReport> {
        let html = export_static_page(composer, page, components)?;
        let dir = self.target_dir(page);
        fs::create_dir_all(&dir)?;
        let path = dir.join(INDEX_FILE);
        fs::write(&path, html.as_bytes())?;

        let report = DeployReport {
            path,
            bytes: html.len(),
            sha256: hex::encode(Sha256::digest(html.as_bytes())),
        };
        info!(
            "deployed page {} to {} ({} bytes, sha256 {})",
            page.id,
            report.path.display(),
            report.bytes,
            report.sha256
        );
        Ok(report)
    }

    /// Remove a deployed page. Returns `Ok(false)` when nothing was deployed there.
    ///
    /// For the root slug only the root `index.html` is removed; sibling slug
    /// directories under the subdomain are left alone.
    pub fn undeploy(&self, subdomain: &str, slug: &str) -> Result<bool> {
        if !crate::model::is_valid_subdomain(subdomain) || !crate::model::is_valid_slug(slug) {
            return Err(Error::InvalidPage(format!(
                "cannot undeploy '{}/{}'",
                subdomain, slug
            )));
        }
        let dir = self.dir_for(subdomain, slug);
        let removed = if slug == ROOT_SLUG {
            remove_if_present(fs::remove_file(dir.join(INDEX_FILE)))?
        } else {
            remove_if_present(fs::remove_dir_all(&dir))?
        };
        if removed {
            info!("removed deployed page {}", dir.display());
        }
        Ok(removed)
    }

    fn dir_for(&self, subdomain: &str, slug: &str) -> PathBuf {
        let base = self.config.output_dir.join(subdomain);
        if slug == ROOT_SLUG {
            base
        } else {
            base.join(slug)
        }
    }
}

fn remove_if_present(result: std::io::Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageConfig;

    fn page(slug: &str, published: bool) -> Page {
        Page {
            id: 3,
            title: "Shop".into(),
            description: String::new(),
            slug: slug.into(),
            subdomain: "acme".into(),
            config: PageConfig::default(),
            is_published: published,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn target_dir_layout() {
        let deployer = Deployer::new(DeployConfig {
            output_dir: PathBuf::from("/srv/sites"),
        });
        assert_eq!(deployer.target_dir(&page("root", true)), PathBuf::from("/srv/sites/acme"));
        assert_eq!(
            deployer.target_dir(&page("pricing", true)),
            PathBuf::from("/srv/sites/acme/pricing")
        );
    }

    #[test]
    fn unpublished_page_is_refused() {
        let err = export_static_page(&Composer::default(), &page("root", false), &[]).unwrap_err();
        assert!(matches!(err, Error::UnpublishedExport { page_id: 3 }));
    }

    #[test]
    fn path_traversal_slug_is_refused() {
        let err = export_static_page(&Composer::default(), &page("../etc", true), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidPage(_)));
    }
}
