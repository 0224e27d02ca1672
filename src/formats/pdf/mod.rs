//! PDF paged-document adapter
//!
//! Structural parsing via `lopdf`: page tree, info dictionary and XMP
//! metadata stream, outline/bookmark tree (with named-destination
//! resolution), per-page text layers, and a cover cascade built from
//! the first page's embedded images.

mod cover;
mod outline;
mod parser;

pub use parser::PdfAdapter;
