#![forbid(unsafe_code)]

//! Records, calendar and configuration for timeclad cladograms (headless).
//!
//! This crate knows nothing about lanes or pixels beyond date positions: it reads inputs into a
//! [`Cladogram`] and a [`Config`], which the layout and render crates consume.

pub mod color;
pub mod config;
pub mod date;
pub mod error;
pub mod model;
pub mod parser;

pub use color::Color;
pub use config::{Config, DuplicateNames};
pub use date::{Calendar, Date};
pub use error::{Error, Result};
pub use model::{Cladogram, Connector, Domain, Image, ImageKind, NameChange, Node};
