pub mod flatten;
pub mod scan;
