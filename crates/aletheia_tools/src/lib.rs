#![forbid(unsafe_code)]

pub mod turn_cli;
