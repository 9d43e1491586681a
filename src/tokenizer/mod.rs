//! Method tokenization
//!
//! A [`Tokenizer`] turns one file's source text into the ordered list of methods it
//! declares, each with the leaf-level tokens of its body. The mapper only depends on
//! this trait, so language front-ends can be swapped without touching matching.

mod syntax;

pub use syntax::{SyntaxTokenizer, supported_extensions};

use crate::types::TokenizedMethod;
use anyhow::Result;

/// Converts source files into per-method token streams
///
/// Implementations must be deterministic for a given `(filename, source_code)` pair.
/// Returned methods are not bound to a commit; the caller stamps the commit id.
pub trait Tokenizer {
    /// Extract the methods declared in `source_code`, in source order
    ///
    /// An empty list means the file declares no methods. Methods whose bodies have no
    /// extractable tokens are reported with a `[""]` token list.
    fn get_methods(&self, filename: &str, source_code: &str) -> Result<Vec<TokenizedMethod>>;

    /// Whether this tokenizer understands the given file at all
    fn supports(&self, _filename: &str) -> bool {
        true
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn get_methods(&self, filename: &str, source_code: &str) -> Result<Vec<TokenizedMethod>> {
        (**self).get_methods(filename, source_code)
    }

    fn supports(&self, filename: &str) -> bool {
        (**self).supports(filename)
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for Box<T> {
    fn get_methods(&self, filename: &str, source_code: &str) -> Result<Vec<TokenizedMethod>> {
        (**self).get_methods(filename, source_code)
    }

    fn supports(&self, filename: &str) -> bool {
        (**self).supports(filename)
    }
}
