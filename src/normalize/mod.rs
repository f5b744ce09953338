pub mod defs;
pub mod pass;
