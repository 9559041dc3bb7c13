pub mod memory;

pub use memory::InMemorySessionTokenStore;
