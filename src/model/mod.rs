pub mod flow;
pub mod object;
