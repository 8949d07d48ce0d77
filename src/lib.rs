#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! readmeservice - README generation for public GitHub repositories
//!
//! The library turns a repository reference into a README in four stages:
//! parse the reference, inspect the repository (default branch, bounded tree
//! listing, dependency manifests), compose a prompt from an instructional
//! template, and ask a hosted model for the document. A small file-backed
//! ledger counts unique visitors for the web front end.
//!
//! ## Usage
//! ```rust,ignore
//! use readmeservice::{Config, ReadmeGenerator};
//!
//! async fn example() -> readmeservice::Result<()> {
//!     let config = Config::load(None)?;
//!     let generator = ReadmeGenerator::from_config(&config)?;
//!     let readme = generator.generate("https://github.com/octocat/Hello-World").await?;
//!     println!("{readme}");
//!     Ok(())
//! }
//! ```

/// HTTP routes and handlers
pub mod api;
/// Hosted text generation
pub mod completion;
/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// GitHub REST access
pub mod github;
pub mod inspector;
/// Logging configuration and utilities
pub mod logging;
/// Stage orchestration for one generation request
pub mod orchestrator;
pub mod prompts;
/// Repository reference parsing
pub mod reference;
pub mod visitors;

// Re-export common types
pub use api::{create_app, AppState};
pub use completion::{ChatCompletionClient, CompletionClient};
pub use config::Config;
pub use error::{Result, ServiceError};
pub use github::{GitHubClient, RepositoryHost};
pub use inspector::{inspect, Inspection, ManifestBundle, TreeListing};
pub use orchestrator::ReadmeGenerator;
pub use prompts::PromptTemplate;
pub use reference::RepositoryReference;
pub use visitors::VisitorLedger;
