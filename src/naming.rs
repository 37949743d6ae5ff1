use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Width of the hex-encoded user id segment.
const USER_ID_WIDTH: usize = 7;

/// Highest sequence number the two-digit field can carry.
pub const MAX_SEQUENCE: u32 = 99;

/// Grammar for stored image names: img.<7 hex>.<alnum code>.<2 digits>.<alpha ext>.
/// Intake and the auditor both parse through this pattern; there is no other
/// source of truth for what counts as a well-formed name.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^img\.([0-9a-f]{7})\.([a-z0-9]+)\.([0-9]{2})(\.[a-z]+)$")
        .expect("image name pattern is a valid regex")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("listing code {0:?} must be non-empty and alphanumeric")]
    InvalidListingCode(String),

    #[error("sequence number {0} is outside 1..=99")]
    SequenceOutOfRange(u32),

    #[error("file name {0:?} has no usable extension")]
    MissingExtension(String),
}

/// Derive the 7-character hex segment from a raw user identifier.
///
/// Keeps only ASCII `[0-9a-f]` characters, left-pads with zeros to width 7
/// and keeps the first 7 characters. Lossy on purpose: distinct raw ids can
/// collide, and the original id cannot be recovered. Not a hash.
pub fn user_id_hex(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || ('a'..='f').contains(c))
        .collect();
    let padded = format!("{:0>width$}", kept, width = USER_ID_WIDTH);
    padded.chars().take(USER_ID_WIDTH).collect()
}

/// A parsed or freshly minted canonical image name.
///
/// The name itself is the identity of a stored image; no database row backs
/// it. `extension` carries its leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    pub user_id_hex: String,
    pub listing_code: String,
    pub sequence: u32,
    pub extension: String,
}

impl ImageName {
    /// Mint a name for a new upload.
    ///
    /// The raw user id goes through [`user_id_hex`]; the extension is taken
    /// from the client's original file name and lowercased. Inputs that
    /// would produce a name outside the grammar are rejected rather than
    /// stored: sequence numbers above 99 do not fit the two-digit field and
    /// are never truncated.
    pub fn new(
        user_id_raw: &str,
        listing_code: &str,
        sequence: u32,
        original_file_name: &str,
    ) -> Result<Self, NamingError> {
        if listing_code.is_empty() || !listing_code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(NamingError::InvalidListingCode(listing_code.to_string()));
        }
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(NamingError::SequenceOutOfRange(sequence));
        }

        let extension = Path::new(original_file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphabetic()))
            .ok_or_else(|| NamingError::MissingExtension(original_file_name.to_string()))?;

        Ok(Self {
            user_id_hex: user_id_hex(user_id_raw),
            listing_code: listing_code.to_string(),
            sequence,
            extension: format!(".{extension}"),
        })
    }

    /// Parse a stored file name. Returns `None` for anything outside the
    /// grammar; never panics.
    pub fn decode(filename: &str) -> Option<Self> {
        let caps = NAME_PATTERN.captures(filename)?;
        Some(Self {
            user_id_hex: caps[1].to_string(),
            listing_code: caps[2].to_string(),
            sequence: caps[3].parse().ok()?,
            extension: caps[4].to_string(),
        })
    }

    /// Grouping key for audit purposes. The grammar matches hex and listing
    /// segments case-insensitively, so the key is folded to lowercase.
    pub fn group_key(&self) -> (String, String) {
        (
            self.user_id_hex.to_ascii_lowercase(),
            self.listing_code.to_ascii_lowercase(),
        )
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "img.{}.{}.{:02}{}",
            self.user_id_hex, self.listing_code, self.sequence, self.extension
        )
    }
}

/// A listing code a client may supply must fit the grammar's alnum segment.
pub fn is_valid_listing_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Server-generated fallback listing code: the current Unix timestamp in
/// milliseconds, rendered in base 36.
pub fn generate_listing_code() -> String {
    to_base36(chrono::Utc::now().timestamp_millis().max(0) as u64)
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_hex_pads_numeric_ids() {
        assert_eq!(user_id_hex("42"), "0000042");
        assert_eq!(user_id_hex("1"), "0000001");
    }

    #[test]
    fn user_id_hex_strips_non_hex_and_truncates() {
        // Mongo-style object id: already hex, keeps the first 7 chars.
        assert_eq!(user_id_hex("507f1f77bcf86cd799439011"), "507f1f7");
        // Uppercase hex letters are outside the kept class and are dropped.
        assert_eq!(user_id_hex("AB12cd"), "00012cd");
        assert_eq!(user_id_hex("user-42!"), "0000e42");
    }

    #[test]
    fn encode_formats_all_segments() {
        let name = ImageName::new("42", "abc123", 1, "kitchen.JPG").unwrap();
        assert_eq!(name.to_string(), "img.0000042.abc123.01.jpg");
    }

    #[test]
    fn encode_decode_round_trips() {
        for seq in [1u32, 7, 42, 99] {
            let name = ImageName::new("507f1f77bcf86cd7", "xyz789", seq, "photo.WebP").unwrap();
            let parsed = ImageName::decode(&name.to_string()).expect("round trip");
            assert_eq!(parsed, name);
            assert_eq!(parsed.sequence, seq);
            assert_eq!(parsed.extension, ".webp");
        }
    }

    #[test]
    fn sequence_zero_and_above_99_are_rejected() {
        assert_eq!(
            ImageName::new("42", "abc", 0, "a.jpg"),
            Err(NamingError::SequenceOutOfRange(0))
        );
        assert_eq!(
            ImageName::new("42", "abc", 100, "a.jpg"),
            Err(NamingError::SequenceOutOfRange(100))
        );
    }

    #[test]
    fn missing_or_bad_extension_is_rejected() {
        assert!(matches!(
            ImageName::new("42", "abc", 1, "noext"),
            Err(NamingError::MissingExtension(_))
        ));
        assert!(matches!(
            ImageName::new("42", "abc", 1, "weird.j2k1"),
            Err(NamingError::MissingExtension(_))
        ));
    }

    #[test]
    fn bad_listing_codes_are_rejected() {
        for code in ["", "has space", "dash-ed", "dot.ted"] {
            assert!(matches!(
                ImageName::new("42", code, 1, "a.jpg"),
                Err(NamingError::InvalidListingCode(_))
            ));
        }
    }

    #[test]
    fn decode_accepts_grammar_case_insensitively() {
        let parsed = ImageName::decode("IMG.0000ABC.XyZ9.07.JPG").expect("case-insensitive");
        assert_eq!(parsed.sequence, 7);
        assert_eq!(parsed.listing_code, "XyZ9");
        assert_eq!(parsed.group_key().1, "xyz9");
    }

    #[test]
    fn decode_rejects_non_conforming_names() {
        for name in [
            "",
            "img.0000042.abc123.01",          // no extension
            "img.0000042.abc123.1.jpg",       // one-digit sequence
            "img.0000042.abc123.001.jpg",     // three-digit sequence
            "img.000042.abc123.01.jpg",       // six hex chars
            "img.0000042..01.jpg",            // empty listing code
            "img.0000042.abc-123.01.jpg",     // dash in listing code
            "img.0000042.abc123.01.jp2g",     // digit in extension
            "thumb.0000042.abc123.01.jpg",    // wrong prefix
            "img.0000042.abc123.01.jpg.bak",  // trailing segment
        ] {
            assert_eq!(ImageName::decode(name), None, "{name:?} should not parse");
        }
    }

    #[test]
    fn base36_matches_js_to_string_36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        // (1700000000000).toString(36) in JS
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn generated_listing_codes_are_alphanumeric() {
        let code = generate_listing_code();
        assert!(is_valid_listing_code(&code));
        assert!(code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
