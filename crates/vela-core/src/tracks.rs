//! Subtitle track enumeration, selection, and encoding override
//!
//! Runs off the engine's file-loaded notification (delivered at most once
//! per load; duplicates are ignored): enumerate the subtitle tracks the
//! engine reports, apply the configured selection strategy, then append any
//! caller-supplied external subtitle files. The encoding override is a
//! user-triggered action that reapplies a codepage and forces a subtitle
//! reload, fire-and-forget.

use crate::engine::{cmd, prop, PlaybackAdapter, PropertyValue};
use crate::types::ExternalSubtitle;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A subtitle track reported by the engine after file load.
///
/// Read-only snapshot; not cached beyond the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub id: i64,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_external: bool,
}

impl SubtitleTrack {
    /// Label shown in the subtitle menu
    pub fn display_name(&self) -> String {
        match self.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) if self.is_external => format!("[ext] {title}"),
            Some(title) => title.to_string(),
            None => match self.language.as_deref().filter(|l| !l.is_empty()) {
                Some(lang) => format!("Subtitles ({lang})"),
                None => format!("Subtitle {}", self.id),
            },
        }
    }
}

impl std::fmt::Display for SubtitleTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lang = self.language.as_deref().unwrap_or("?");
        let title = self.title.as_deref().unwrap_or("");
        let ext = if self.is_external { " [ext]" } else { "" };
        if title.is_empty() {
            write!(f, "#{} ({}){}", self.id, lang, ext)
        } else {
            write!(f, "#{} {} ({}){}", self.id, title, lang, ext)
        }
    }
}

/// How the initial subtitle track is chosen on file load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Accept whatever track the engine auto-selected
    #[default]
    EngineDefault,
    /// Prefer a track matching the configured language tags, falling back
    /// to the first subtitle track, then none
    PreferredLanguage,
}

/// Subtitle auto-selection behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitlePreferences {
    pub strategy: SelectionStrategy,
    /// Language tags or translated labels matched case-insensitively as
    /// substrings against track language and title
    pub preferred_languages: Vec<String>,
}

/// Subtitle codepage choices offered by the encoding menu
pub const ENCODING_CHOICES: &[(&str, &str)] = &[
    ("auto", "Auto detect"),
    ("utf8", "UTF-8"),
    ("utf8:utf8-broken", "UTF-8 (repair broken)"),
    ("enca:zh:utf8", "Chinese auto detect"),
    ("+cp936", "GBK/GB2312 (Simplified)"),
    ("+big5", "Big5 (Traditional)"),
    ("+gbk", "GBK"),
    ("+gb18030", "GB18030"),
    ("latin1", "Latin-1"),
    ("iso-8859-1", "ISO-8859-1"),
];

/// Menu entry id used to turn subtitles off
pub const SUBTITLE_OFF: i64 = 0;

/// Walks `track-list/*` and collects the subtitle tracks
pub fn enumerate_subtitles(adapter: &dyn PlaybackAdapter) -> Vec<SubtitleTrack> {
    let count = adapter.read_i64(prop::TRACK_COUNT).unwrap_or(0);
    let mut tracks = Vec::new();
    for index in 0..count {
        if adapter
            .read_str(&prop::track_field(index, "type"))
            .as_deref()
            != Some("sub")
        {
            continue;
        }
        let Some(id) = adapter.read_i64(&prop::track_field(index, "id")) else {
            continue;
        };
        tracks.push(SubtitleTrack {
            id,
            language: adapter.read_str(&prop::track_field(index, "lang")),
            title: adapter.read_str(&prop::track_field(index, "title")),
            is_external: adapter
                .read_flag(&prop::track_field(index, "external"))
                .unwrap_or(false),
        });
    }
    tracks
}

/// Applies the selection policy on file load and serves the subtitle and
/// encoding menus afterwards
pub struct TrackSelector {
    prefs: SubtitlePreferences,
    externals: Vec<ExternalSubtitle>,
    file_loaded: bool,
    selected: Option<i64>,
}

impl TrackSelector {
    pub fn new(prefs: SubtitlePreferences, externals: Vec<ExternalSubtitle>) -> Self {
        Self {
            prefs,
            externals,
            file_loaded: false,
            selected: None,
        }
    }

    /// Currently active subtitle track id
    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn is_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Handles the engine's file-loaded notification.
    ///
    /// Idempotent: duplicate notifications with no intervening reset are
    /// ignored. Returns whether this call did the work.
    pub fn on_file_loaded(&mut self, adapter: &dyn PlaybackAdapter) -> bool {
        if self.file_loaded {
            debug!("duplicate file-loaded notification ignored");
            return false;
        }
        self.file_loaded = true;

        adapter.try_set(prop::SUB_VISIBILITY, PropertyValue::Flag(true));

        let tracks = enumerate_subtitles(adapter);
        info!(count = tracks.len(), "subtitle tracks enumerated");
        for track in &tracks {
            debug!(track = %track, "subtitle track");
        }

        self.selected = match self.prefs.strategy {
            SelectionStrategy::EngineDefault => {
                adapter.read_i64(prop::SID).filter(|id| *id > SUBTITLE_OFF)
            }
            SelectionStrategy::PreferredLanguage => {
                let choice = self
                    .preferred_track(&tracks)
                    .or_else(|| tracks.first().map(|t| t.id));
                match choice {
                    Some(id) => {
                        adapter.try_set(prop::SID, PropertyValue::Int(id));
                        Some(id)
                    }
                    None => None,
                }
            }
        };
        match self.selected {
            Some(id) => info!(sid = id, "subtitle track active"),
            None => info!("no subtitle track selected"),
        }

        // External files are appended after enumeration: "auto" keeps the
        // current selection, "select" activates the newly added track.
        let mode = if self.selected.is_some() {
            "auto"
        } else {
            "select"
        };
        for (index, sub) in self.externals.clone().into_iter().enumerate() {
            let title = if sub.title.is_empty() {
                format!("External subtitle {}", index + 1)
            } else {
                sub.title
            };
            match adapter.command(cmd::SUB_ADD, &[&sub.url, mode, &title]) {
                Ok(()) => info!(title = %title, mode, "external subtitle added"),
                Err(err) => warn!(url = %sub.url, %err, "failed to add external subtitle"),
            }
        }
        if mode == "select" && !self.externals.is_empty() {
            self.selected = adapter.read_i64(prop::SID).filter(|id| *id > SUBTITLE_OFF);
        }

        true
    }

    fn preferred_track(&self, tracks: &[SubtitleTrack]) -> Option<i64> {
        for tag in &self.prefs.preferred_languages {
            let tag = tag.to_lowercase();
            let matched = tracks.iter().find(|track| {
                track
                    .language
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains(&tag))
                    || track
                        .title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&tag))
            });
            if let Some(track) = matched {
                return Some(track.id);
            }
        }
        None
    }

    /// Builds the subtitle menu: a leading "Off" entry followed by every
    /// track the engine currently reports
    pub fn menu(&self, adapter: &dyn PlaybackAdapter) -> Vec<(i64, String)> {
        let mut items = vec![(SUBTITLE_OFF, "Off".to_string())];
        items.extend(
            enumerate_subtitles(adapter)
                .iter()
                .map(|track| (track.id, track.display_name())),
        );
        items
    }

    /// Applies a subtitle menu selection
    pub fn select(&mut self, adapter: &dyn PlaybackAdapter, id: i64) {
        adapter.try_set(prop::SID, PropertyValue::Int(id));
        if id == SUBTITLE_OFF {
            adapter.try_set(prop::SUB_VISIBILITY, PropertyValue::Flag(false));
            self.selected = None;
        } else {
            adapter.try_set(prop::SUB_VISIBILITY, PropertyValue::Flag(true));
            self.selected = Some(id);
        }
    }

    /// Loads one more external subtitle at runtime and activates it
    pub fn load_external(
        &mut self,
        adapter: &dyn PlaybackAdapter,
        url: &str,
        title: &str,
    ) -> crate::Result<()> {
        adapter
            .command(cmd::SUB_ADD, &[url, "select", title])
            .map_err(|_| crate::Error::SubtitleLoad {
                url: url.to_string(),
            })?;
        self.selected = adapter.read_i64(prop::SID).filter(|id| *id > SUBTITLE_OFF);
        info!(url, "external subtitle loaded");
        Ok(())
    }

    /// Current subtitle codepage, `auto` when the engine does not answer
    pub fn current_encoding(&self, adapter: &dyn PlaybackAdapter) -> String {
        adapter
            .read_str(prop::SUB_CODEPAGE)
            .unwrap_or_else(|| "auto".to_string())
    }

    /// Reapplies the subtitle codepage and forces a reload.
    ///
    /// Fire-and-forget: there is no verification that the reload fixed the
    /// encoding.
    pub fn apply_encoding(&self, adapter: &dyn PlaybackAdapter, codepage: &str) {
        adapter.try_set(prop::SUB_CODEPAGE, PropertyValue::Str(codepage.to_string()));
        if self.selected.is_some() {
            adapter.try_command(cmd::SUB_RELOAD, &[]);
        }
        info!(codepage, "subtitle encoding reapplied");
    }
}
