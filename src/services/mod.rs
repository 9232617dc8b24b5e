pub mod comments;
pub mod diff;
pub mod document;
