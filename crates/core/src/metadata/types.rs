//! Types for the metadata module.

use serde::{Deserialize, Serialize};

/// Tags of one audio track, as far as naming and publishing need them.
///
/// Missing tags are empty strings. `track` is kept as the raw tag value
/// (possibly unpadded, possibly `"3/12"`); see [`crate::naming::pad_track`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub album: String,
    pub artist: String,
    /// Album artist, falling back to `artist` when the file has no such tag.
    pub album_artist: String,
    pub title: String,
    pub track: String,
    /// First audio stream, for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<CodecInfo>,
}

impl TrackMetadata {
    /// Convenience constructor for the fields used in output naming.
    pub fn new(track: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets artist and album, with the album artist following the artist.
    pub fn with_album(mut self, artist: impl Into<String>, album: impl Into<String>) -> Self {
        self.artist = artist.into();
        self.album_artist = self.artist.clone();
        self.album = album.into();
        self
    }
}

/// Stream-level codec information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecInfo {
    pub codec_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
}
