//! # bankrecon-extract
//!
//! Reference extraction from free-text bank narratives.
//!
//! Each bank workflow carries its own ordered catalogue of
//! (pattern, extractor) rules; the first matching rule wins. Catalogues are
//! compiled once at construction and applied row by row, yielding a short
//! canonical reference and, where the bank provides one, a fee or an
//! RJ-number.

pub mod absa;
pub mod bidvest;
pub mod corporate;
pub mod fnb;
pub mod kazang;
pub mod rules;

pub use rules::*;
