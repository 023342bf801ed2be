//! Readers that turn external inputs into a [`Cladogram`](crate::model::Cladogram).

pub mod csv;
pub mod dir;

pub use csv::{explode_safely, parse_csv, read_csv};
pub use dir::parse_dir;
