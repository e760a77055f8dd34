//! fOS HTML Parser
//!
//! HTML5 parser built on html5ever, producing `fos-dom` documents.

mod parser;

pub use fos_dom::Document;
pub use parser::HtmlParser;
