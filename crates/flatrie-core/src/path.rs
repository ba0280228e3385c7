//! Trie paths and the prefix algebra every structural query is built on

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

/// An ordered sequence of symbols identifying a trie position.
///
/// Paths compare lexicographically by symbol, which is exactly the order the
/// node array is kept in. Any byte is a valid symbol.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<u8>);

impl Path {
    /// Create a path from raw symbols
    pub fn new(symbols: impl Into<Vec<u8>>) -> Self {
        Self(symbols.into())
    }

    /// The empty path (root of every trie)
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Raw symbols
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Symbol at `depth`, if the path is that long
    pub fn symbol(&self, depth: usize) -> Option<u8> {
        self.0.get(depth).copied()
    }

    /// This path extended by one symbol
    pub fn child(&self, symbol: u8) -> Path {
        let mut symbols = Vec::with_capacity(self.0.len() + 1);
        symbols.extend_from_slice(&self.0);
        symbols.push(symbol);
        Path(symbols)
    }

    /// The first `len` symbols of this path
    pub fn truncated(&self, len: usize) -> Path {
        Path(self.0[..len.min(self.0.len())].to_vec())
    }

    /// True if `self` is a prefix of (or equal to) `other`
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }
}

/// Length of the longest shared leading run of symbols.
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Longest shared leading subsequence of two paths; empty if none.
pub fn longest_common_prefix(a: &Path, b: &Path) -> Path {
    a.truncated(common_prefix_len(a, b))
}

impl Deref for Path {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Path {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Path {
    fn from(bytes: &[u8]) -> Self {
        Path(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Path {
    fn from(bytes: Vec<u8>) -> Self {
        Path(bytes)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "Path({:?})", s),
            Err(_) => write!(f, "Path(0x{})", hex::encode(&self.0)),
        }
    }
}

/// JSON form of a symbol run: plain text when the bytes are UTF-8, an explicit
/// `{"hex": ...}` object otherwise.
pub(crate) mod symbol_text {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Hex { hex: String },
    }

    pub fn serialize<S: Serializer>(symbols: &[u8], s: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(symbols) {
            Ok(text) => Repr::Text(text.to_owned()),
            Err(_) => Repr::Hex {
                hex: hex::encode(symbols),
            },
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        match Repr::deserialize(d)? {
            Repr::Text(text) => Ok(text.into_bytes()),
            Repr::Hex { hex } => hex::decode(hex).map_err(serde::de::Error::custom),
        }
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        symbol_text::serialize(&self.0, s)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Path, D::Error> {
        symbol_text::deserialize(d).map(Path)
    }
}
