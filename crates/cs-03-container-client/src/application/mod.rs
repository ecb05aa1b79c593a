//! # Application Layer

pub mod client;

pub use client::ContainerClient;
