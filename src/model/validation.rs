//! Validation of upstream drafts into graph entities.
//!
//! A rejected record is reported as a [`ValidationError`]; callers log it
//! and move on to the next record, never aborting the batch.

use super::draft::{ArtistDraft, CreditDraft, ImageDraft, TrackDraft};
use super::{Artist, Credit, Image, Track};

/// Why a draft was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("record has no id")]
    MissingId,

    #[error("{0} must be a non-empty string")]
    MissingField(&'static str),

    #[error("{field} must be a non-negative integer, got {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("images must be a list")]
    MissingImages,

    #[error("image {0} must have url and size strings")]
    MalformedImage(usize),
}

/// Validate an artist draft.
///
/// Accepts iff id, name, url and a well-formed image list are present.
pub fn artist(draft: ArtistDraft) -> Result<Artist, ValidationError> {
    let id = identity(draft.id)?;
    let name = required("name", draft.name)?;
    let url = required("url", draft.url)?;
    let images = images(draft.images)?;

    Ok(Artist {
        id,
        name,
        url,
        images,
        tracks: Vec::new(),
    })
}

/// Validate a track draft.
pub fn track(draft: TrackDraft) -> Result<Track, ValidationError> {
    let id = identity(draft.id)?;
    let name = required("name", draft.name)?;
    let url = required("url", draft.url)?;
    let artist = required("artist", draft.artist_id)?;

    // Last.fm reports an unknown duration as 0
    let duration = match draft.duration.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(number("duration", raw)?).filter(|d| *d > 0),
    };
    let playcount = number(
        "playcount",
        draft
            .playcount
            .as_deref()
            .ok_or(ValidationError::MissingField("playcount"))?,
    )?;
    let listeners = number(
        "listeners",
        draft
            .listeners
            .as_deref()
            .ok_or(ValidationError::MissingField("listeners"))?,
    )?;
    let images = images(draft.images)?;

    Ok(Track {
        id,
        name,
        url,
        artist,
        duration,
        playcount,
        listeners,
        images,
        credits: Vec::new(),
    })
}

/// Validate a credit draft. Only the contributing artist id is mandatory.
pub fn credit(draft: CreditDraft) -> Result<Credit, ValidationError> {
    let artist_id = identity(draft.artist_id)?;
    let name = draft.name.unwrap_or_default();
    let credited_name = draft
        .credited_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| name.clone());

    Ok(Credit {
        artist_id,
        sort_name: draft.sort_name.unwrap_or_default(),
        credited_name,
        join_phrase: draft.join_phrase.unwrap_or_default(),
        name,
    })
}

fn identity(id: Option<String>) -> Result<String, ValidationError> {
    match id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ValidationError::MissingId),
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn number(field: &'static str, raw: &str) -> Result<u64, ValidationError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::NotNumeric {
            field,
            value: raw.to_string(),
        })
}

fn images(images: Option<Vec<ImageDraft>>) -> Result<Vec<Image>, ValidationError> {
    images
        .ok_or(ValidationError::MissingImages)?
        .into_iter()
        .enumerate()
        .map(|(i, img)| match (img.url, img.size) {
            (Some(url), Some(size)) => Ok(Image { url, size }),
            _ => Err(ValidationError::MalformedImage(i)),
        })
        .collect()
}
