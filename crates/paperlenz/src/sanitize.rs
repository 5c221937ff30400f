//! Extraction of a JSON object from a language model reply.
//!
//! Models asked for "only JSON" still wrap their answer in markdown fences, preface it with
//! explanatory prose, or sign off with a friendly remark. The functions here cut such a reply
//! down to the JSON text that should be handed to the decoder.
//!
//! Two strategies are available:
//!
//! - [`SanitizeStrategy::Heuristic`] (default): slice from the first `{` to the last `}` and strip
//!   any remaining fence. It does not track brace depth or string literals, so a stray `}` in
//!   trailing prose widens the slice and decoding then fails.
//! - [`SanitizeStrategy::Streaming`]: return the first complete JSON object found by a streaming
//!   decoder, which understands strings and nesting. Falls back to the heuristic when no complete
//!   object is found.
//!
//! # Examples
//!
//! ```
//! use paperlenz::sanitize::sanitize;
//!
//! let reply = "Here is the JSON:\n```json\n{\"a\":1}\n```\nHope this helps!";
//! assert_eq!(sanitize(reply), "{\"a\":1}");
//! ```

use serde::de::IgnoredAny;

use super::*;

/// Markdown code fence delimiter.
const FENCE: &str = "```";

/// How a model reply is reduced to JSON text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizeStrategy {
  /// First `{` to last `}`, then fence stripping
  #[default]
  Heuristic,
  /// First complete object according to a streaming JSON decoder
  Streaming,
}

impl SanitizeStrategy {
  /// Applies the strategy to a raw reply.
  pub fn apply<'a>(&self, text: &'a str) -> &'a str {
    match self {
      Self::Heuristic => sanitize(text),
      Self::Streaming => extract_json_object(text).unwrap_or_else(|| {
        debug!("No complete JSON object found, falling back to brace slicing");
        sanitize(text)
      }),
    }
  }
}

/// Cuts a model reply down to its JSON object, best effort.
///
/// 1. Trim whitespace.
/// 2. If a `{` occurs before the last `}`, keep only that inclusive span.
/// 3. Strip a leading fence (with or without a language tag) and a trailing fence.
/// 4. Trim again.
///
/// When the reply contains no `{` or no `}`, step 2 leaves it unchanged.
pub fn sanitize(text: &str) -> &str {
  let mut cleaned = text.trim();

  if let (Some(first), Some(last)) = (cleaned.find('{'), cleaned.rfind('}')) {
    if first < last {
      cleaned = &cleaned[first..=last];
    }
  }

  strip_fences(cleaned).trim()
}

/// Removes one opening fence (and its language tag) and one closing fence.
fn strip_fences(text: &str) -> &str {
  let mut text = text;

  if let Some(rest) = text.strip_prefix(FENCE) {
    let tag_len = rest
      .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')))
      .unwrap_or(rest.len());
    let after_tag = &rest[tag_len..];
    let is_tag = after_tag.is_empty()
      || after_tag.starts_with(char::is_whitespace)
      || after_tag.starts_with(['{', '[']);
    text = if is_tag { after_tag } else { rest };
  }

  if let Some(rest) = text.strip_suffix(FENCE) {
    text = rest;
  }

  text
}

/// Finds the first complete JSON object in `text`.
///
/// Every `{` is tried as a starting point in order; the first one from which a streaming decoder
/// reads a whole value wins, and exactly that value's text is returned. Braces inside string
/// literals and prose around the object are handled correctly.
pub fn extract_json_object(text: &str) -> Option<&str> {
  for (start, _) in text.match_indices('{') {
    let candidate = &text[start..];
    let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<IgnoredAny>();
    if let Some(Ok(_)) = stream.next() {
      return Some(&candidate[..stream.byte_offset()]);
    }
  }
  None
}
