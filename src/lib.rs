//! Core library for the sat-catalogs command line application.
//!
//! The library turns the loosely structured worksheets of the SAT CFDI
//! catalog workbook into clean JSON record lists, one file per sheet, grouped
//! under a directory per catalog date. IO adapters live under
//! [`sat::catalogs::io`], data representations inside [`sat::catalogs::model`],
//! the header-detection and record extraction engine in
//! [`sat::catalogs::convert`], and the per-run orchestration under
//! [`sat::catalogs::pipeline`].

pub mod sat;

pub use sat::catalogs::{CatalogError, Result, SheetError, convert, error, io, model, pipeline};
