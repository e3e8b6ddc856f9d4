//! Data models for persistence and API responses.

/// Binary file models.
pub mod file;
/// Text paste models.
pub mod paste;


pub use file::{download_file_name, FileEntry, FileInfo, NewFile};
pub use paste::{NewPaste, Paste};
