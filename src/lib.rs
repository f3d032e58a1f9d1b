//! Persistent domain-name trees
//!
//! A [`Tree`] maps canonical domain names to values. Every update returns a
//! new version of the tree that shares unchanged structure with the old one,
//! so snapshots are cheap to take and safe to read from many threads.
//!
//! Keys sort label by label from the top-level domain down, so a domain and
//! its subdomains are adjacent and can be listed with [`Tree::subdomains`].

pub mod domain;
pub use domain::{Config, DomainKey, Iter, MalformedDomainError, Subdomains, Tree};

/// Loading trees from domain list files.
pub mod storage;
pub use storage::{load, LoadError};
