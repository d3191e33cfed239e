//! Sliding-window LZ77 compression.
//!
//! The compressed stream is a flat sequence of 3-byte tokens
//! `[offset][length][literal]`: copy `length` bytes starting `offset` bytes
//! back in the output, then append `literal`. There is no header, so an
//! empty input compresses to an empty stream.
//!
//! ```
//! use std::io::Cursor;
//!
//! let mut compressed = Vec::new();
//! lz77::encode(&mut Cursor::new(b"ABABABAB"), &mut compressed, &lz77::Config::default()).unwrap();
//!
//! let mut restored = Vec::new();
//! lz77::decode(&mut Cursor::new(compressed), &mut restored).unwrap();
//! assert_eq!(restored, b"ABABABAB");
//! ```

pub mod config;
pub mod error;
pub mod lz;
pub mod matcher;
pub mod token;
pub mod window;

pub use config::Config;
pub use error::{LzError, Result};
pub use lz::{decode, encode, DecodeStats, Decoder, EncodeStats, Encoder};
pub use token::Token;
pub use window::WindowBuffer;
