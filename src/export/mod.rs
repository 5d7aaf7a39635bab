pub mod header;
pub mod image;
pub mod table;
