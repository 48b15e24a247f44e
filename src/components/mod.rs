pub mod content;
pub mod status_bar;
pub mod tree;
