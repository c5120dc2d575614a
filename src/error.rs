//! Error types for the mirroring core.
//!
//! Nothing here ever reaches the host application: the controller catches
//! every variant, logs it and falls back to the disabled state.

use std::fmt;

use thiserror::Error;

use crate::controller::SetupStage;

/// A host collaborator the core looks up on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The main scene camera.
    Camera,
    /// The active audio listener.
    AudioListener,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Camera => f.write_str("main camera"),
            Resource::AudioListener => f.write_str("audio listener"),
        }
    }
}

#[derive(Error, Debug)]
pub enum MirrorError {
    /// A collaborator is missing; the affected feature is skipped.
    #[error("{0} not available")]
    ResourceUnavailable(Resource),

    /// An optional host capability is absent or unusable; a default is used.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// Setup or rebuild failed part-way; the controller tears everything down.
    #[error("mirror setup failed while trying to {stage}")]
    RebuildFailure {
        stage: SetupStage,
        #[source]
        source: Box<MirrorError>,
    },

    /// The render device refused an allocation.
    #[error("render device: {0}")]
    Device(String),

    /// The host UI refused to create or update the overlay node.
    #[error("ui layer: {0}")]
    Ui(String),
}

impl MirrorError {
    pub(crate) fn at(stage: SetupStage, source: MirrorError) -> Self {
        MirrorError::RebuildFailure {
            stage,
            source: Box::new(source),
        }
    }
}

pub type MirrorResult<T> = Result<T, MirrorError>;
