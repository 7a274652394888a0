//! Statecraft Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Statecraft
//! parser, layout solver and editor. It includes:
//!
//! - **Document**: The attributed element tree with its markup writer ([`document`] module)
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Semantic**: State-machine vocabulary and policies ([`semantic`] module)
//! - **Visual**: Visual metadata records and attribute codecs ([`visual`] module)

pub mod document;
pub mod geometry;
pub mod semantic;
pub mod visual;
