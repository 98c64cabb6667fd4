pub mod condense;
pub mod interpret;
pub mod rebuild;
pub mod show;
