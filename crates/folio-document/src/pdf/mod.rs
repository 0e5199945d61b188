// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — composing image collections into PDFs and inspecting the result.

pub mod composer;
pub mod reader;

pub use composer::{DocumentArtifact, DocumentComposer, FinalizedDocument, PageImage};
pub use reader::PdfReader;
