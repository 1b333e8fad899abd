//! Audit log implementations

pub mod file;
pub mod memory;

pub use file::FileAuditLog;
pub use memory::MemoryAuditLog;
