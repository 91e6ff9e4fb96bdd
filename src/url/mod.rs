//! URL handling module for Page Atlas
//!
//! This module provides URL normalization, domain scoping, and file-type
//! detection for link targets.

mod domain;
mod filetype;
mod normalize;

// Re-export main functions
pub use domain::{base_domain_of, strip_www, DomainScope};
pub use filetype::{classify, file_name, is_document, is_ignored_asset, FileKind};
pub use normalize::{canonicalize, normalize_url};
