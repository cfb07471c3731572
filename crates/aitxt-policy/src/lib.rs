//! Access decisions and validation for ai.txt documents
//!
//! Built on the document model from the `aitxt` crate. Resolution merges the
//! three tiers of a document (named agent, wildcard, site-wide) field by
//! field; training may additionally be gated on the request path through
//! glob rules where deny patterns always win.
//!
//! # Example
//!
//! ```
//! use aitxt::{parse_text, PolicyField};
//! use aitxt_policy::{can_access, validate};
//!
//! let doc = parse_text(
//!     "Site-Name: News\n\
//!      Site-URL: https://news.example\n\
//!      Training: conditional\n\
//!      Training-Allow: /blog/*\n\
//!      Training-Deny: /blog/premium/*\n",
//! )
//! .document
//! .unwrap();
//!
//! assert!(can_access(&doc, "anybot", PolicyField::Training, Some("/blog/post-1")).allowed);
//! assert!(!can_access(&doc, "anybot", PolicyField::Training, Some("/blog/premium/x")).allowed);
//! assert!(validate(&doc).valid);
//! ```

pub mod glob;
pub mod resolver;
pub mod validator;
pub mod verdict;

pub use glob::{match_glob, GlobError, GlobPattern};
pub use resolver::{can_access, match_path, resolve_policy, ResolvedPolicy};
pub use validator::{validate, ValidationReport};
pub use verdict::{AccessResult, Finding, Severity};
