//! Core type definitions shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a message on a simulated connection.
///
/// Every connection keeps independent codec state per direction, so a
/// request never diffs against a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Client to server.
    Request,
    /// Server to client.
    Response,
}

impl Direction {
    /// Both directions, requests first.
    pub const ALL: [Direction; 2] = [Direction::Request, Direction::Response];

    /// Short label used in reports and output file names.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Direction::Request => "req",
            Direction::Response => "res",
        }
    }

    /// Position of this direction in per-direction arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Direction::Request => 0,
            Direction::Response => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per [`Direction`], indexed without hashing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerDirection<T> {
    request: T,
    response: T,
}

impl<T> PerDirection<T> {
    /// Builds a pair by calling `make` once per direction, requests first.
    pub fn from_fn(mut make: impl FnMut(Direction) -> T) -> Self {
        Self {
            request: make(Direction::Request),
            response: make(Direction::Response),
        }
    }

    /// Value for `direction`.
    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::Request => &self.request,
            Direction::Response => &self.response,
        }
    }

    /// Mutable value for `direction`.
    pub fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::Request => &mut self.request,
            Direction::Response => &mut self.response,
        }
    }
}
