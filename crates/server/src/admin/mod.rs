//! Server-rendered admin UI.

pub mod data_table;
pub mod pages;
