//! EPUB container adapter
//!
//! Parses the OCF container directly: ZIP archive access via `zip`,
//! package/navigation documents via `quick-xml`. Supports EPUB 2 (NCX)
//! and EPUB 3 (nav document) navigation.

mod parser;

pub use parser::EpubAdapter;
