mod list_file;

pub use list_file::{load, read, Entry, Listing, LoadError, MalformedEntry};
