//! Key paths: dotted strings or pre-split segment lists.

use serde::{Deserialize, Serialize};

/// Splits paths on a separator. The default separator is `.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathCodec {
    separator: String,
}

impl Default for PathCodec {
    fn default() -> Self {
        Self::new(".")
    }
}

impl PathCodec {
    pub fn new(separator: &str) -> Self {
        Self {
            separator: separator.to_string(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Split `path` into segments.
    ///
    /// `"a.b"` → `["a", "b"]`. Segment lists pass through unchanged. The empty
    /// string yields a single empty segment.
    pub fn split<P: KeyPath + ?Sized>(&self, path: &P) -> Vec<String> {
        path.segments(&self.separator)
    }

    /// Join segments back into a path string.
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        segments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}

/// Anything that can address a location in a parameter tree.
///
/// Strings are split on the container's separator; arrays, slices and vectors
/// of strings are taken as already-split segments.
pub trait KeyPath {
    fn segments(&self, separator: &str) -> Vec<String>;
}

impl KeyPath for str {
    fn segments(&self, separator: &str) -> Vec<String> {
        if separator.is_empty() {
            return vec![self.to_string()];
        }
        self.split(separator).map(str::to_string).collect()
    }
}

impl KeyPath for String {
    fn segments(&self, separator: &str) -> Vec<String> {
        self.as_str().segments(separator)
    }
}

impl<S: AsRef<str>> KeyPath for [S] {
    fn segments(&self, _separator: &str) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> KeyPath for [S; N] {
    fn segments(&self, separator: &str) -> Vec<String> {
        self.as_slice().segments(separator)
    }
}

impl<S: AsRef<str>> KeyPath for Vec<S> {
    fn segments(&self, separator: &str) -> Vec<String> {
        self.as_slice().segments(separator)
    }
}

impl<P: KeyPath + ?Sized> KeyPath for &P {
    fn segments(&self, separator: &str) -> Vec<String> {
        (**self).segments(separator)
    }
}
