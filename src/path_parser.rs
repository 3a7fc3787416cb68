//! Encoded journey path parsing
//!
//! Journey paths arrive as strings like `"1&A_SA@2&C_OLV"`: touches
//! separated by `@`, each touch a 1-based index and a channel code
//! joined by `&`. The parser resolves codes to display labels via a
//! [`ChannelMap`] and validates that the touch indices form a
//! contiguous 1..n permutation, so a corrupted row can never produce
//! a partially-decoded path.

use crate::channel_map::ChannelMap;
use thiserror::Error;

/// Separator between touches in an encoded path
pub const TOUCH_DELIMITER: char = '@';

/// Separator between the touch index and the channel code
pub const INDEX_DELIMITER: char = '&';

/// Errors for encoded path decoding
///
/// Any of these rejects the whole path; no partial sequence is ever
/// returned. Callers exclude the row from aggregation and record the
/// reason (skip-and-count, never silent).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty path")]
    EmptyPath,

    #[error("malformed touch segment '{segment}'")]
    MalformedSegment { segment: String },

    #[error("touch index '{index}' is not a positive integer")]
    BadIndex { index: String },

    #[error("touch indices are not a contiguous 1..{count} permutation")]
    NonContiguousIndices { count: usize },

    #[error("unknown channel code '{code}'")]
    UnknownChannel { code: String },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Decode an encoded path into an ordered sequence of channel labels
///
/// Touch order follows the encoded indices, not the order segments
/// appear in the string, so `"2&B@1&A"` decodes to `[A, B]`.
///
/// # Errors
///
/// Returns [`ParseError`] when a segment cannot be split into
/// index + code, an index is not a positive integer, the index set is
/// not exactly `{1..n}`, or a code is missing from `map`.
///
/// # Example
///
/// ```
/// use atribuir::channel_map::ChannelMap;
/// use atribuir::path_parser::parse_path;
///
/// let map = ChannelMap::from_pairs([
///     ("A_SA", "Awareness Search Ads"),
///     ("C_OLV", "Consideration Online Video Ads"),
/// ]);
///
/// let path = parse_path("1&A_SA@2&C_OLV", &map).unwrap();
/// assert_eq!(
///     path,
///     vec!["Awareness Search Ads", "Consideration Online Video Ads"]
/// );
/// ```
pub fn parse_path(encoded: &str, map: &ChannelMap) -> Result<Vec<String>> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(ParseError::EmptyPath);
    }

    let segments: Vec<&str> = encoded.split(TOUCH_DELIMITER).collect();
    let count = segments.len();

    // Slots are filled by encoded index; a duplicate index hits an
    // occupied slot and an out-of-range index has no slot, both of
    // which break the 1..n permutation invariant.
    let mut slots: Vec<Option<String>> = vec![None; count];

    for segment in segments {
        let segment = segment.trim();
        let (index_str, code) = segment
            .split_once(INDEX_DELIMITER)
            .ok_or_else(|| ParseError::MalformedSegment {
                segment: segment.to_string(),
            })?;

        let index: usize = index_str
            .trim()
            .parse()
            .map_err(|_| ParseError::BadIndex {
                index: index_str.trim().to_string(),
            })?;
        if index == 0 {
            return Err(ParseError::BadIndex {
                index: index_str.trim().to_string(),
            });
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(ParseError::MalformedSegment {
                segment: segment.to_string(),
            });
        }

        let label = map
            .label(code)
            .ok_or_else(|| ParseError::UnknownChannel {
                code: code.to_string(),
            })?;

        if index > count || slots[index - 1].is_some() {
            return Err(ParseError::NonContiguousIndices { count });
        }
        slots[index - 1] = Some(label.to_string());
    }

    // Every slot filled means the indices were exactly {1..n}.
    slots
        .into_iter()
        .collect::<Option<Vec<String>>>()
        .ok_or(ParseError::NonContiguousIndices { count })
}
