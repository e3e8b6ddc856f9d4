//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// Canonical file rows (`FileEntry`, bincode-encoded).
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");
/// Expiry index for files ordered by expiry-millis then id.
pub const FILES_BY_EXPIRY: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("files_by_expiry");

/// Canonical paste rows (`Paste`, bincode-encoded).
pub const PASTES: TableDefinition<&str, &[u8]> = TableDefinition::new("pastes");
/// Expiry index for pastes ordered by expiry-millis then id.
pub const PASTES_BY_EXPIRY: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("pastes_by_expiry");
