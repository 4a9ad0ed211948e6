//! Error type shared by every wrapper in the crate.
//!
//! Each failure carries a human readable message, an [`ErrorKind`] and the
//! source location of the call that detected it.

use std::panic::Location;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A file could not be opened or read.
    FileLoad,
    /// An image file was read but could not be decoded.
    ImageDecode,
    /// An image has a channel count with no matching pixel format.
    UnsupportedFormat,
    /// A texture upload was requested before any image was loaded.
    ImageNotLoaded,
    CreateBuffer,
    CreateTexture,
    CreateShader,
    CreateProgram,
    /// A shader stage failed to compile. The message holds the driver log.
    ShaderCompile,
    /// The program failed to link. The message holds the driver log.
    ShaderLink,
    /// A uniform was registered before the program existed.
    ProgramNotCreated,
    WindowingInit,
    /// [`crate::GlApp::initialize`] was called on an application that already has a window.
    AlreadyInitialized,
    WindowCreation,
    /// The GL context could not be created, made current or loaded.
    GlLoaderInit,
    /// The frame loop was started on an application that is not initialized.
    NotInitialized,
    MissingParameter,
    InvalidParameter,
    ConfigParse,
    Logging,
}

/// A failure raised by one of the wrappers.
#[derive(Debug, thiserror::Error)]
#[error("{message} ({kind:?} at {location})")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    location: &'static Location<'static>,
}

impl Error {
    /// Creates a new error, recording the caller's source location.
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: Location::caller(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the failing call was made.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}
