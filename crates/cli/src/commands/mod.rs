pub mod migrate;
pub mod orders;
pub mod quote;
