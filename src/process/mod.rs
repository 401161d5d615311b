// src/process/mod.rs

pub mod date_parser;
pub mod extract;
pub mod normalize;
pub mod reader;

pub use extract::{extract_usd_rates, Extracted, RateRecord};
pub use normalize::{normalize, NormalizedRow};
pub use reader::{read_workbook, Cell, RawRow};
