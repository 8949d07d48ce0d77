//! Repository inspection: default branch, bounded tree listing and manifests.

use crate::error::Result;
use crate::github::{FileContent, RepositoryHost};
use crate::reference::RepositoryReference;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Default cap on listed paths
pub const DEFAULT_LISTING_LIMIT: usize = 200;

/// Line appended to a listing that was cut short
pub const TRUNCATION_MARKER: &str = "...(more files)...";

/// Dependency manifests looked up at the repository root, in lookup order
pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "go.mod",
    "Cargo.toml",
    "pyproject.toml",
];

/// Ordered file paths, capped at a fixed number of entries
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeListing {
    entries: Vec<String>,
    truncated: bool,
}

impl TreeListing {
    /// Keeps the first `limit` paths in their original order
    pub fn new(mut paths: Vec<String>, limit: usize) -> Self {
        let truncated = paths.len() > limit;
        paths.truncate(limit);
        Self { entries: paths, truncated }
    }

    /// Kept paths, without the marker
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether paths were dropped
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Listing lines, with the truncation marker last when paths were dropped
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(String::as_str)
            .chain(self.truncated.then_some(TRUNCATION_MARKER))
    }

    /// Listing as newline-separated text
    pub fn render(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

/// A fetched dependency manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Recognized file name
    pub file_name: String,
    /// Decoded text content
    pub content: String,
}

/// Manifests that exist in the repository and were fetched, in [`MANIFEST_FILES`] order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManifestBundle {
    manifests: Vec<Manifest>,
}

impl ManifestBundle {
    /// Builds a bundle, dropping unrecognized names and ordering by [`MANIFEST_FILES`]
    pub fn from_manifests(manifests: impl IntoIterator<Item = Manifest>) -> Self {
        let mut manifests: Vec<Manifest> = manifests
            .into_iter()
            .filter(|m| MANIFEST_FILES.contains(&m.file_name.as_str()))
            .collect();
        manifests.sort_by_key(|m| manifest_rank(&m.file_name));
        manifests.dedup_by(|a, b| a.file_name == b.file_name);
        Self { manifests }
    }

    /// Content of `file_name`, if it was fetched
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.manifests
            .iter()
            .find(|m| m.file_name == file_name)
            .map(|m| m.content.as_str())
    }

    /// Included manifests in lookup order
    pub fn iter(&self) -> impl Iterator<Item = &Manifest> {
        self.manifests.iter()
    }

    /// Number of manifests included
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// True when no manifest was included
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

fn manifest_rank(file_name: &str) -> usize {
    MANIFEST_FILES
        .iter()
        .position(|f| *f == file_name)
        .unwrap_or(MANIFEST_FILES.len())
}

/// Result of inspecting a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Default branch the tree was read from
    pub branch: String,
    /// Bounded path listing
    pub listing: TreeListing,
    /// Fetched manifests
    pub manifests: ManifestBundle,
}

/// Inspects a repository through `host`.
///
/// Metadata and tree failures are returned. Manifest failures are logged and
/// the manifest is left out.
pub async fn inspect(
    host: &dyn RepositoryHost,
    reference: &RepositoryReference,
    listing_limit: usize,
) -> Result<Inspection> {
    let metadata = host.get_repository(reference).await?;
    let branch = metadata.default_branch;
    debug!("Default branch for {} is {}", reference, branch);

    let paths: Vec<String> = host
        .get_tree(reference, &branch)
        .await?
        .into_iter()
        .map(|entry| entry.path)
        .collect();
    info!("Tree for {}@{} has {} entries", reference, branch, paths.len());

    let present: Vec<&str> = MANIFEST_FILES
        .iter()
        .copied()
        .filter(|file| paths.iter().any(|p| p == file))
        .collect();

    let fetches = present.iter().map(|file| fetch_manifest(host, reference, file));
    let manifests = join_all(fetches).await.into_iter().flatten();

    Ok(Inspection {
        branch,
        listing: TreeListing::new(paths, listing_limit),
        manifests: ManifestBundle::from_manifests(manifests),
    })
}

async fn fetch_manifest(
    host: &dyn RepositoryHost,
    reference: &RepositoryReference,
    file_name: &str,
) -> Option<Manifest> {
    match host.get_file_content(reference, file_name).await {
        Ok(content) => match decode_file(&content) {
            Some(text) => Some(Manifest {
                file_name: file_name.to_string(),
                content: text,
            }),
            None => {
                debug!("Skipping {} in {}: not a file with content", file_name, reference);
                None
            }
        },
        Err(e) => {
            warn!("Failed to fetch {} from {}: {}", file_name, reference, e);
            None
        }
    }
}

/// Decodes a contents-endpoint file. Non-files and empty payloads yield `None`.
pub fn decode_file(file: &FileContent) -> Option<String> {
    if file.kind != "file" {
        return None;
    }
    match file.encoding.as_deref() {
        None | Some("base64") => {}
        Some(other) => {
            debug!("Skipping file with {} encoding", other);
            return None;
        }
    }
    let encoded = file.content.as_deref().filter(|c| !c.is_empty())?;

    // GitHub wraps base64 payloads at 60 columns
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!("Invalid base64 content: {}", e);
            None
        }
    }
}
