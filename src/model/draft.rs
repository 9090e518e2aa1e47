//! Unvalidated records produced by the source adapters.
//!
//! Drafts are what the translation functions output: every field is
//! optional and numbers are kept in their textual form, so that
//! [`validation`](super::validation) can say exactly what was wrong.

/// An image descriptor before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDraft {
    pub url: Option<String>,
    pub size: Option<String>,
}

/// An artist record before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub images: Option<Vec<ImageDraft>>,
}

/// A track record before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    /// Owning artist id
    pub artist_id: Option<String>,
    pub duration: Option<String>,
    pub playcount: Option<String>,
    pub listeners: Option<String>,
    pub images: Option<Vec<ImageDraft>>,
}

/// A single artist credit on a recording before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreditDraft {
    pub artist_id: Option<String>,
    pub name: Option<String>,
    pub sort_name: Option<String>,
    pub credited_name: Option<String>,
    pub join_phrase: Option<String>,
}

/// A recording and its credit list, as returned by the credit source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingDraft {
    pub id: String,
    pub credits: Vec<CreditDraft>,
}
