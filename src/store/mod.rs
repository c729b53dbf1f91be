pub mod disk;
pub mod memory;

pub use disk::FileSettingsStore;
pub use memory::MemorySettingsStore;
