//! Error types shared across the crate.
//!
//! Everything in here is fatal: a descriptor the grammar rejects, a
//! reference-build inconsistency, or a malformed configuration file means
//! the produced annotations could not be trusted, so the run aborts instead
//! of skipping the offending record.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The HGVS grammar rejected the input.
    #[error("could not parse {hgvs:?}: {message}")]
    Parse { hgvs: String, message: String },

    /// Equal base identifier but differing version, e.g. a criterion for
    /// `ENST123.4` evaluated against `ENST123.5`. Points at criteria and
    /// variants coming from different reference builds.
    #[error("version mismatch between {left} and {right}")]
    VersionMismatch { left: String, right: String },

    /// The reading frame was requested for a variant it is not defined for.
    #[error("frame is not defined for {hgvs:?}: {reason}")]
    FrameUndefined { hgvs: String, reason: String },

    /// The colocated variants of a VEP record carry conflicting or malformed
    /// population frequency data.
    #[error("ambiguous population frequencies on {location}: {reason}")]
    AmbiguousFrequency { location: String, reason: String },

    /// Invalid region bounds on a criterion (end without start, or start
    /// after end).
    #[error("invalid region bounds: {message}")]
    Region { message: String },

    /// A criteria or known-variants file could not be loaded.
    #[error("malformed {path}: {message}")]
    Config { path: String, message: String },
}

impl Error {
    pub(crate) fn parse(hgvs: &str, message: impl Into<String>) -> Self {
        Error::Parse {
            hgvs: hgvs.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn frame_undefined(hgvs: &str, reason: impl Into<String>) -> Self {
        Error::FrameUndefined {
            hgvs: hgvs.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(path: &str, message: impl Into<String>) -> Self {
        Error::Config {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
