// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Messages name the offending image whenever the error knows it.

use crate::error::FolioError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something went wrong that may not happen again, e.g. a disk hiccup.
    Transient,
    /// User must do something (pick another file, add an image, finish editing).
    ActionRequired,
    /// Cannot be fixed by trying again — broken file, unsupported format.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again could succeed. Nothing retries on
    /// its own; this only decides whether a "Try again" action is offered.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        // -- Collection errors --
        FolioError::NotAnImage { name, .. } => HumanError {
            message: format!("\"{name}\" isn't a picture."),
            suggestion: "Only image files (JPEG, PNG, WebP and similar) can be added. Choose a photo instead.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::EmptyCollection => HumanError {
            message: "There are no pictures to put in the PDF.".into(),
            suggestion: "Please add at least one image, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::ImageNotFound(_) => HumanError {
            message: "That picture is no longer in the list.".into(),
            suggestion: "It may have been removed. Pick another picture to edit.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Editor errors --
        FolioError::InvalidState(detail) => HumanError {
            message: "That can't be done right now.".into(),
            suggestion: format!("Finish or cancel what you're doing in the editor first. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::SessionAlreadyOpen => HumanError {
            message: "Another picture is already open in the editor.".into(),
            suggestion: "Save or close it before editing a different picture.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::RenderError(_) => HumanError {
            message: "Your changes couldn't be saved.".into(),
            suggestion: "Try saving again. If it keeps failing, reset the picture and redo your edits.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Document errors --
        FolioError::ImageDecode { name, .. } => HumanError {
            message: format!("There's a problem with the picture \"{name}\"."),
            suggestion: "The image may be damaged or in an unusual format. Remove it, or save it as a JPEG or PNG and add it again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try creating the PDF again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        FolioError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Folio doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or choose a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        FolioError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Fix or delete the settings file; Folio will fall back to its defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
