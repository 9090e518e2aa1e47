//! MusicBrainz XML (MMD) response shapes.
//!
//! The XML web service wraps the same data as the JSON one in a
//! `<metadata>` document; it is parsed with `quick-xml` and folded into
//! the JSON DTOs so the adapter only deals with one shape.

use serde::Deserialize;

use super::dto;

/// `<metadata>` root
#[derive(Debug, Deserialize)]
pub struct Metadata {
    #[serde(rename = "recording-list")]
    pub recording_list: RecordingList,
}

#[derive(Debug, Deserialize)]
pub struct RecordingList {
    #[serde(rename = "@count")]
    pub count: u32,
    #[serde(rename = "@offset", default)]
    pub offset: u32,
    #[serde(rename = "recording", default)]
    pub recordings: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
pub struct Recording {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: Option<String>,
    #[serde(rename = "artist-credit")]
    pub artist_credit: Option<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
pub struct ArtistCredit {
    #[serde(rename = "name-credit", default)]
    pub name_credits: Vec<NameCredit>,
}

#[derive(Debug, Deserialize)]
pub struct NameCredit {
    #[serde(rename = "@joinphrase")]
    pub joinphrase: Option<String>,
    pub name: Option<String>,
    pub artist: Artist,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    #[serde(rename = "@id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "sort-name")]
    pub sort_name: Option<String>,
}

/// Parse an XML search response into the JSON DTO shape.
pub fn parse_search(body: &str) -> Result<dto::SearchResponse, quick_xml::de::DeError> {
    let metadata: Metadata = quick_xml::de::from_str(body)?;
    let list = metadata.recording_list;

    Ok(dto::SearchResponse {
        count: list.count,
        offset: list.offset,
        recordings: list
            .recordings
            .into_iter()
            .map(|r| dto::Recording {
                id: r.id,
                title: r.title,
                artist_credit: r
                    .artist_credit
                    .map(|ac| ac.name_credits)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|nc| dto::ArtistCredit {
                        name: nc.name,
                        joinphrase: nc.joinphrase,
                        artist: dto::Artist {
                            id: nc.artist.id,
                            name: nc.artist.name,
                            sort_name: nc.artist.sort_name,
                        },
                    })
                    .collect(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xml_search() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata xmlns="http://musicbrainz.org/ns/mmd-2.0#" xmlns:ns2="http://musicbrainz.org/ns/ext#-2.0">
  <recording-list count="12" offset="0">
    <recording id="rec-1" ns2:score="100">
      <title>Ms. Jackson</title>
      <artist-credit>
        <name-credit joinphrase=" feat. ">
          <artist id="art-outkast">
            <name>OutKast</name>
            <sort-name>OutKast</sort-name>
          </artist>
        </name-credit>
        <name-credit>
          <name>Dre</name>
          <artist id="art-andre">
            <name>André 3000</name>
            <sort-name>3000, André</sort-name>
          </artist>
        </name-credit>
      </artist-credit>
    </recording>
  </recording-list>
</metadata>"#;

        let response = parse_search(xml).expect("Should parse XML search");

        assert_eq!(response.count, 12);
        let credits = &response.recordings[0].artist_credit;
        assert_eq!(credits.len(), 2);
        assert_eq!(credits[0].joinphrase.as_deref(), Some(" feat. "));
        assert_eq!(credits[0].artist.id.as_deref(), Some("art-outkast"));
        assert_eq!(credits[1].name.as_deref(), Some("Dre"));
        assert_eq!(credits[1].artist.sort_name.as_deref(), Some("3000, André"));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(parse_search("<metadata><recording-list>").is_err());
    }
}
