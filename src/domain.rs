//! Domain names and the persistent tree keyed by them.
//!
//! [`DomainKey`] is the canonical form every lookup is made against.
//! [`Tree`] is the persistent map built on top of it. [`Config`] controls how
//! domain lists are read into a tree.

/// Canonical domain keys and their validation rules.
pub mod key;
pub use key::{DomainKey, Labels, MalformedDomainError};

mod config;
pub use config::Config;

/// The persistent red-black tree.
pub mod tree;
pub use tree::{Iter, Subdomains, Tree};
