pub mod convert;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;

pub use error::{CatalogError, Result, SheetError};
