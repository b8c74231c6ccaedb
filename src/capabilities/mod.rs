mod dialog;
mod export;
mod storage;

pub use self::dialog::{Dialog, DialogOperation, DialogOutput};
pub use self::export::{
    export_filename, Export, ExportDocument, ExportError, ExportOperation, ExportOutput,
    ExportResult, ExportStats,
};
pub use self::storage::{
    Storage, StorageError, StorageKey, StorageOperation, StorageOutput, StorageResult,
};

// Crux's built-in Render capability is used directly; it already does
// everything a "repaint everything" renderer needs.
pub use crux_core::render::Render;

use crate::{App, Event};

pub type AppRender = Render<Event>;
pub type AppStorage = Storage<Event>;
pub type AppDialog = Dialog<Event>;
pub type AppExport = Export<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub storage: Storage<Event>,
    pub dialog: Dialog<Event>,
    pub export: Export<Event>,
}
