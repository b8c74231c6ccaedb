//! PDF export capability. The shell owns the HTML-to-PDF collaborator;
//! the core hands it the document header data (title, description,
//! computed stats) and the target filename, and flips the print-only
//! region on while the export runs.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind, EXPORT_FILENAME_SUFFIX};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub stops: usize,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub filename: String,
    pub title: String,
    pub description: String,
    pub stats: ExportStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportOperation {
    RenderPdf { document: ExportDocument },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportOutput {
    Completed { filename: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportError {
    #[error("export failed: {reason}")]
    Failed { reason: String },

    #[error("export cancelled")]
    Cancelled,
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::new(ErrorKind::Export, e.to_string())
    }
}

pub type ExportResult = Result<ExportOutput, ExportError>;

impl Operation for ExportOperation {
    type Output = ExportResult;
}

/// Filename for the downloaded PDF: whitespace runs in the title become
/// underscores, then the fixed suffix is appended.
#[must_use]
pub fn export_filename(title: &str) -> String {
    let mut name = String::with_capacity(title.len() + EXPORT_FILENAME_SUFFIX.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                name.push('_');
                in_whitespace = true;
            }
        } else {
            name.push(c);
            in_whitespace = false;
        }
    }
    name.push_str(EXPORT_FILENAME_SUFFIX);
    name
}

pub struct Export<Ev> {
    context: CapabilityContext<ExportOperation, Ev>,
}

impl<Ev> Capability<Ev> for Export<Ev> {
    type Operation = ExportOperation;
    type MappedSelf<MappedEv> = Export<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Export::new(self.context.map_event(f))
    }
}

impl<Ev> Export<Ev> {
    #[must_use]
    pub fn new(context: CapabilityContext<ExportOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Export<Ev>
where
    Ev: Send + 'static,
{
    pub fn pdf<F>(&self, document: ExportDocument, make_event: F)
    where
        F: FnOnce(ExportResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let response = context
                .request_from_shell(ExportOperation::RenderPdf { document })
                .await;
            context.update_app(make_event(response));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_collapses_whitespace_runs() {
        assert_eq!(export_filename("Paris Getaway"), "Paris_Getaway_PlanTrip.pdf");
        assert_eq!(
            export_filename("Pacific  Coast\tHwy"),
            "Pacific_Coast_Hwy_PlanTrip.pdf"
        );
    }

    #[test]
    fn filename_keeps_leading_and_trailing_markers() {
        assert_eq!(export_filename(" padded "), "_padded__PlanTrip.pdf");
    }

    #[test]
    fn untitled_filename_matches_fallback_title() {
        assert_eq!(
            export_filename(crate::UNTITLED_EXPORT_TITLE),
            "Untitled_Itinerary_PlanTrip.pdf"
        );
    }
}
