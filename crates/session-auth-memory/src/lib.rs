// session-auth-memory — in-memory database adapter.
//
// HashMap-backed store for tests, local development and prototyping.

pub mod adapter;

pub use adapter::MemoryAdapter;
