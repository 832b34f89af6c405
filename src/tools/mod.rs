// Modular tools
pub mod fetch;
