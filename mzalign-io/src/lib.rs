// src/lib.rs
pub mod data {
    pub mod reader;
    pub mod writer;
}

pub mod error;
