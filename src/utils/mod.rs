pub mod datetime;
pub mod palette;
pub mod url;
