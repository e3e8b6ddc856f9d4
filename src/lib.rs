//! Root crate facade for the Ephemera server and core.

pub use ephemera_core::{
    blob, detection, gate, lifecycle, store, sweep, ExpirySweeper, FileEntry, FileInfo,
    FileManager, OpContext, Paste, PasteManager,
};
pub use ephemera_server::{
    config, create_app, error, handlers, models, resolve_bind_address, run, serve_router,
    shutdown_signal, ttl, AppError, AppState, Config, Database, DEFAULT_PORT,
};
