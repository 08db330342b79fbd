//! Vela Engine - libmpv adapter
//!
//! Concrete [`vela_core::PlaybackAdapter`] over libmpv, feature-gated with
//! `mpv`. Without the feature, [`create_adapter`] returns the
//! engine-unavailable error and nothing links against the native library.
//!
//! The adapter runs a dedicated worker thread that owns the mpv handle;
//! commands and property traffic round-trip over request channels, engine
//! notifications are pumped onto the core's typed event stream. That keeps
//! the thread-affine parts of the client API on one thread while the
//! adapter surface stays `Send + Sync`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vela_core::PlaybackAdapter;

#[cfg(feature = "mpv")]
mod mpv;
#[cfg(feature = "mpv")]
pub use mpv::MpvAdapter;

/// Engine initialization options, a distilled subset of the player's mpv
/// option block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Video output driver handed to mpv
    pub video_output: String,
    /// Enable hardware decoding
    pub hwdec: bool,
    /// Demuxer cache target in seconds
    pub cache_secs: i64,
    /// Network timeout in seconds
    pub network_timeout_secs: i64,
    /// Initial subtitle codepage
    pub sub_codepage: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            video_output: "gpu".to_string(),
            hwdec: true,
            cache_secs: 30,
            network_timeout_secs: 120,
            sub_codepage: "enca:zh:utf8".to_string(),
        }
    }
}

/// Start the libmpv engine and return its adapter
#[cfg(feature = "mpv")]
pub fn create_adapter(options: &EngineOptions) -> vela_core::Result<Arc<dyn PlaybackAdapter>> {
    Ok(Arc::new(MpvAdapter::new(options)?))
}

#[cfg(not(feature = "mpv"))]
pub fn create_adapter(_options: &EngineOptions) -> vela_core::Result<Arc<dyn PlaybackAdapter>> {
    Err(vela_core::Error::EngineUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.video_output, "gpu");
        assert!(options.hwdec);
        assert_eq!(options.cache_secs, 30);
    }

    #[cfg(not(feature = "mpv"))]
    #[test]
    fn test_adapter_unavailable_without_feature() {
        let err = create_adapter(&EngineOptions::default()).err().unwrap();
        assert_eq!(err.error_code(), "ENGINE_UNAVAILABLE");
    }
}
