pub mod agent;
pub mod controller;
pub mod core;
pub mod knowledge;
pub mod llm;
pub mod server;
pub mod session;
pub mod state;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;
