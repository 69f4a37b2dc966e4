//! Checks applied to paste content before it is stored.
//!
//! The rules run in a fixed order and stop at the first failure. The final
//! rule is a small denylist of script-like patterns; it is a best-effort
//! abuse heuristic and not a sanitization step. Content that passes is
//! stored byte-for-byte.

use thiserror::Error;
use typed_builder::TypedBuilder;

/// Largest accepted paste, in UTF-8 bytes.
pub const DEFAULT_MAX_CONTENT_BYTES: usize = 1024 * 1024;
/// Longest accepted line, in characters.
pub const DEFAULT_MAX_LINE_CHARS: usize = 10_000;
/// Most newlines a paste may contain.
pub const DEFAULT_MAX_NEWLINES: usize = 100_000;

/// Thresholds used by [`ContentValidator`].
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ValidationLimits {
    #[builder(default = DEFAULT_MAX_CONTENT_BYTES)]
    pub max_bytes: usize,
    #[builder(default = DEFAULT_MAX_LINE_CHARS)]
    pub max_line_chars: usize,
    #[builder(default = DEFAULT_MAX_NEWLINES)]
    pub max_newlines: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Why a piece of content was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentRejection {
    #[error("content cannot be empty")]
    Empty,
    #[error("content too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },
    #[error("content contains invalid null bytes")]
    NullByte,
    #[error("line {line} exceeds maximum length of {max} characters")]
    LineTooLong { line: usize, max: usize },
    #[error("too many newlines ({count}, max {max})")]
    TooManyNewlines { count: usize, max: usize },
    #[error("suspicious content pattern detected: {0}")]
    Suspicious(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct ContentValidator {
    limits: ValidationLimits,
}

impl ContentValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Validates `content` against the configured limits.
    pub fn validate(&self, content: &str) -> Result<(), ContentRejection> {
        if content.trim().is_empty() {
            return Err(ContentRejection::Empty);
        }

        if content.len() > self.limits.max_bytes {
            return Err(ContentRejection::TooLarge {
                size: content.len(),
                max: self.limits.max_bytes,
            });
        }

        if content.contains('\0') {
            return Err(ContentRejection::NullByte);
        }

        let max_line = self.limits.max_line_chars;
        for (index, line) in content.split('\n').enumerate() {
            // a line can't hold more characters than bytes
            if line.len() > max_line && line.chars().count() > max_line {
                return Err(ContentRejection::LineTooLong {
                    line: index + 1,
                    max: max_line,
                });
            }
        }

        let newlines = content.bytes().filter(|b| *b == b'\n').count();
        if newlines > self.limits.max_newlines {
            return Err(ContentRejection::TooManyNewlines {
                count: newlines,
                max: self.limits.max_newlines,
            });
        }

        if let Some(pattern) = find_suspicious_pattern(content) {
            return Err(ContentRejection::Suspicious(pattern));
        }

        Ok(())
    }
}

/// Validates `content` with the default limits.
pub fn validate_content(content: &str) -> Result<(), ContentRejection> {
    ContentValidator::default().validate(content)
}

fn find_suspicious_pattern(content: &str) -> Option<&'static str> {
    // ASCII lowercasing keeps byte offsets stable
    let lowered = content.to_ascii_lowercase();

    if has_call(&lowered, "eval") {
        return Some("eval call");
    }
    if has_call(&lowered, "exec") {
        return Some("exec call");
    }
    if has_script_block(&lowered) {
        return Some("script tag");
    }
    None
}

/// Matches `name`, optional whitespace, then `(`.
fn has_call(haystack: &str, name: &str) -> bool {
    haystack.match_indices(name).any(|(start, _)| {
        haystack[start + name.len()..]
            .trim_start()
            .starts_with('(')
    })
}

/// Matches `<script ...>` followed anywhere later by `</script>`.
fn has_script_block(haystack: &str) -> bool {
    // Only the first opening tag matters: any later tag closes no earlier
    // than the first one does.
    let Some(open) = haystack.find("<script") else {
        return false;
    };
    let Some(tag_end) = haystack[open..].find('>') else {
        return false;
    };
    haystack[open + tag_end + 1..].contains("</script>")
}
