//! Instructional template and prompt composition.

use crate::error::{ServiceError, Result};
use crate::inspector::{ManifestBundle, TreeListing};
use crate::reference::RepositoryReference;
use std::fmt::Write as _;
use std::path::Path;

/// Template compiled into the binary, used unless a file overrides it
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/readme_prompt.md");

/// Section headings the generated document must contain, in order
pub const REQUIRED_SECTIONS: &[&str] = &[
    "Project Title",
    "Project Structure",
    "Getting Started",
    "Deployment",
    "Useful CLI Commands",
    "Support & Contribution",
    "Contact & Last Updated",
];

/// Instructional text placed ahead of the project context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptTemplate {
    /// Wraps template text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Loads a template from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("Failed to read prompt template {}: {}", path.display(), e))
        })?;
        if text.trim().is_empty() {
            return Err(ServiceError::Config(format!("Prompt template {} is empty", path.display())));
        }
        Ok(Self::new(text))
    }

    /// Template text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Required sections that are absent or appear out of order
    pub fn missing_sections(&self) -> Vec<&'static str> {
        let mut cursor = 0;
        let mut missing = Vec::new();
        for section in REQUIRED_SECTIONS {
            match self.text[cursor..].find(section) {
                Some(offset) => cursor += offset + section.len(),
                None => missing.push(*section),
            }
        }
        missing
    }

    /// Builds the full prompt. Identical inputs give byte-identical output.
    pub fn compose(
        &self,
        reference: &RepositoryReference,
        listing: &TreeListing,
        manifests: &ManifestBundle,
    ) -> String {
        let mut key_files = String::new();
        for manifest in manifests.iter() {
            let _ = write!(key_files, "\n--- {} ---\n{}\n", manifest.file_name, manifest.content);
        }

        format!(
            "{}\n\n---\nProject Context:\nProject: {}\nFile Structure (partial):\n{}\n\nKey Dependency Files:\n{}\n",
            self.text.trim_end(),
            reference,
            listing.render(),
            key_files
        )
    }
}
