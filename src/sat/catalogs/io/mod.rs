pub mod catalog_write;
pub mod excel_read;
pub mod fetch;
pub mod lookup;
