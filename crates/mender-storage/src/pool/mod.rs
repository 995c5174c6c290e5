//! Connection management. SQLite allows one writer, so the store keeps a single
//! connection behind an async mutex.

pub mod pragmas;
pub mod write_connection;

pub use write_connection::WriteConnection;
