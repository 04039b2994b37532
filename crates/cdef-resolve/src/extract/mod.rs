//! SQL-backed element extraction.

pub mod all_in_one;
pub mod table;

pub use all_in_one::{AllInOneGroup, extract_all_in_one};
pub use table::{build_select, escape_text, extract_table_elements, sanitize_element_name};
