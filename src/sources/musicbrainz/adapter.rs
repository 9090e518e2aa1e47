//! Adapter layer: Convert MusicBrainz DTOs to drafts
//!
//! This is the ONLY place where MusicBrainz DTO types are translated.

use super::dto;
use crate::model::{CreditDraft, RecordingDraft};
use crate::sources::domain::RecordingsPage;

/// Convert a recording search response to a page of recording drafts
pub fn to_recordings_page(response: dto::SearchResponse) -> RecordingsPage {
    RecordingsPage {
        count: response.count,
        offset: response.offset,
        recordings: response
            .recordings
            .into_iter()
            .map(to_recording_draft)
            .collect(),
    }
}

fn to_recording_draft(recording: dto::Recording) -> RecordingDraft {
    RecordingDraft {
        id: recording.id,
        credits: recording
            .artist_credit
            .into_iter()
            .map(to_credit_draft)
            .collect(),
    }
}

/// Map a single artist credit. The credited name falls back to the
/// official name during validation.
fn to_credit_draft(credit: dto::ArtistCredit) -> CreditDraft {
    CreditDraft {
        artist_id: credit.artist.id,
        name: credit.artist.name,
        sort_name: credit.artist.sort_name,
        credited_name: credit.name,
        join_phrase: credit.joinphrase,
    }
}
