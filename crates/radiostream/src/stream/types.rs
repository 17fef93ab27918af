//! Stream types
//!
//! Core types describing a negotiated stream session.

use std::fmt;

/// Codec negotiated from the response content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    Mp3,
    Ogg,
    Wav,
    Aac,
    AacPlus,
    #[default]
    Unknown,
}

impl Codec {
    /// Short display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Codec::Mp3 => "MP3",
            Codec::Ogg => "OGG",
            Codec::Wav => "WAV",
            Codec::Aac => "AAC",
            Codec::AacPlus => "AAC+",
            Codec::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio bytes still expected from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteBudget {
    /// Declared by `Content-Length`
    Remaining(u64),
    /// No usable length (absent, unparseable, or chunked body)
    Unbounded,
}

impl ByteBudget {
    pub fn from_content_length(length: Option<u64>) -> Self {
        length.map_or(ByteBudget::Unbounded, ByteBudget::Remaining)
    }

    /// Account for bytes delivered to the sink. Unbounded budgets are untouched.
    pub fn consume(&mut self, bytes: usize) {
        if let ByteBudget::Remaining(left) = self {
            *left = left.saturating_sub(bytes as u64);
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, ByteBudget::Remaining(0))
    }

    /// Bytes still expected, or `None` when unbounded
    pub fn remaining(&self) -> Option<u64> {
        match self {
            ByteBudget::Remaining(left) => Some(*left),
            ByteBudget::Unbounded => None,
        }
    }
}

/// HTTP basic-auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// One-shot options for a single `open` call
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub credentials: Option<Credentials>,
    /// Resume offset sent as `Range: bytes=N-`
    pub range_start: Option<u64>,
}

impl OpenOptions {
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_range_start(mut self, offset: u64) -> Self {
        self.range_start = Some(offset);
        self
    }
}

/// Parameters agreed with the server for a live session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    /// URL actually streaming (after any playlist hops)
    pub url: String,
    pub codec: Codec,
    pub station_name: Option<String>,
    /// Audio bytes between ICY metadata blocks; 0 when disabled
    pub metaint: usize,
    pub chunked: bool,
    pub budget: ByteBudget,
    /// Server answered 206 to a range request
    pub resumed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_names() {
        assert_eq!(Codec::Mp3.to_string(), "MP3");
        assert_eq!(Codec::AacPlus.to_string(), "AAC+");
        assert_eq!(Codec::default(), Codec::Unknown);
        assert_eq!(Codec::Unknown.as_str(), "UNKNOWN");
    }

    #[test]
    fn budget_from_content_length() {
        assert_eq!(ByteBudget::from_content_length(Some(10)), ByteBudget::Remaining(10));
        assert_eq!(ByteBudget::from_content_length(None), ByteBudget::Unbounded);
        assert_eq!(ByteBudget::from_content_length(Some(0)).remaining(), Some(0));
    }

    #[test]
    fn budget_consume_saturates() {
        let mut b = ByteBudget::Remaining(5);
        b.consume(3);
        assert_eq!(b, ByteBudget::Remaining(2));
        b.consume(10);
        assert!(b.is_exhausted());
    }

    #[test]
    fn unbounded_budget_never_exhausts() {
        let mut b = ByteBudget::Unbounded;
        b.consume(usize::MAX);
        assert!(!b.is_exhausted());
        assert_eq!(b.remaining(), None);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let c = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", c);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn open_options_builders() {
        let o = OpenOptions::default()
            .with_range_start(4096)
            .with_credentials(Credentials::new("u", "p"));
        assert_eq!(o.range_start, Some(4096));
        assert_eq!(o.credentials.map(|c| c.user), Some("u".to_string()));
    }
}
