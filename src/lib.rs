// lib.rs - PlanTrip shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod image_processing;
pub mod store;
pub mod templates;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::capabilities::{ExportResult, StorageResult};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use store::TripStore;
pub use templates::TripTemplate;

pub const TRIPS_STORAGE_KEY: &str = "plantrip_data_v4";
pub const LAST_TRIP_STORAGE_KEY: &str = "lastAccessedTripId";

pub const DEFAULT_TRIP_NAME: &str = "New Adventure";
pub const UNTITLED_TRIP_NAME: &str = "Untitled Adventure";
pub const UNTITLED_EXPORT_TITLE: &str = "Untitled Itinerary";
pub const NO_DESCRIPTION_FALLBACK: &str = "No description provided.";
pub const EXPORT_FILENAME_SUFFIX: &str = "_PlanTrip.pdf";

pub const NEW_STOP_FORM_TITLE: &str = "New Adventure Stop";
pub const EDIT_STOP_FORM_TITLE: &str = "Edit Stop";

pub const DELETE_TRIP_PROMPT: &str =
    "Are you sure you want to permanently delete this adventure?";
pub const DELETE_STOP_PROMPT: &str = "Delete this stop?";
pub const LOAD_TEMPLATE_PROMPT: &str = "Replace current adventure with a template?";

pub const STOP_SAVED_TOAST: &str = "Added to itinerary!";
pub const TEMPLATE_LOADED_TOAST: &str = "Template loaded!";
pub const EXPORTED_TOAST: &str = "Itinerary Exported!";
pub const STORAGE_FULL_MESSAGE: &str = "Storage full! Photos might be too big.";

pub const TOAST_DURATION_MS: u64 = 3000;

pub const MAX_PHOTO_DIMENSION: u32 = 800;
pub const PHOTO_JPEG_QUALITY: u8 = 80;
pub const MAX_PHOTO_INPUT_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_SOURCE_DIMENSION: u32 = 8192;
pub const MAX_DECODE_ALLOC_BYTES: u64 = 256 * 1024 * 1024;

pub const MS_PER_DAY: u64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Storage,
    QuotaExceeded,
    Serialization,
    Deserialization,
    ImageProcessing,
    ImageTooLarge,
    ImageFormatUnsupported,
    Export,
    Validation,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Storage => "STORAGE_ERROR",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::ImageProcessing => "IMAGE_PROCESSING_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::Export => "EXPORT_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::QuotaExceeded => STORAGE_FULL_MESSAGE.into(),
            ErrorKind::Storage => {
                "Unable to save data locally. Please free up some storage space.".into()
            }
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred while reading saved adventures.".into()
            }
            ErrorKind::ImageProcessing => {
                "Unable to process the image. Please try a different photo.".into()
            }
            ErrorKind::ImageTooLarge => {
                format!(
                    "The image is too large. Please use an image smaller than {} MB.",
                    MAX_PHOTO_INPUT_BYTES / 1_000_000
                )
            }
            ErrorKind::ImageFormatUnsupported => {
                "This image format is not supported. Please use JPEG, PNG, or WebP.".into()
            }
            ErrorKind::Export => "The itinerary could not be exported. Please try again.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::Internal => "An unexpected error occurred. Please try again.".into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripId(pub String);

impl TripId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StopId(pub String);

impl StopId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The nine fixed classification tags. Anything else read back from
/// storage degrades to the default presentation instead of failing the
/// whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    Sightseeing,
    Food,
    Transport,
    Lodging,
    Activity,
    Shopping,
    Nature,
    Relax,
    Entertainment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub icon: &'static str,
    pub color: &'static str,
    pub border: &'static str,
}

impl Category {
    pub const ALL: [Self; 9] = [
        Self::Sightseeing,
        Self::Food,
        Self::Transport,
        Self::Lodging,
        Self::Activity,
        Self::Shopping,
        Self::Nature,
        Self::Relax,
        Self::Entertainment,
    ];

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sightseeing" => Some(Self::Sightseeing),
            "food" => Some(Self::Food),
            "transport" => Some(Self::Transport),
            "lodging" => Some(Self::Lodging),
            "activity" => Some(Self::Activity),
            "shopping" => Some(Self::Shopping),
            "nature" => Some(Self::Nature),
            "relax" => Some(Self::Relax),
            "entertainment" => Some(Self::Entertainment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sightseeing => "sightseeing",
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Lodging => "lodging",
            Self::Activity => "activity",
            Self::Shopping => "shopping",
            Self::Nature => "nature",
            Self::Relax => "relax",
            Self::Entertainment => "entertainment",
        }
    }

    #[must_use]
    pub fn label(self) -> String {
        self.as_str().to_uppercase()
    }

    #[must_use]
    pub const fn style(self) -> CategoryStyle {
        match self {
            Self::Sightseeing => CategoryStyle {
                icon: "fa-camera",
                color: "bg-pink-100 text-pink-600",
                border: "border-pink-200",
            },
            Self::Food => CategoryStyle {
                icon: "fa-burger",
                color: "bg-orange-100 text-orange-600",
                border: "border-orange-200",
            },
            Self::Transport => CategoryStyle {
                icon: "fa-plane-up",
                color: "bg-blue-100 text-blue-600",
                border: "border-blue-200",
            },
            Self::Lodging => CategoryStyle {
                icon: "fa-bed",
                color: "bg-indigo-100 text-indigo-600",
                border: "border-indigo-200",
            },
            Self::Activity => CategoryStyle {
                icon: "fa-person-hiking",
                color: "bg-emerald-100 text-emerald-600",
                border: "border-emerald-200",
            },
            Self::Shopping => CategoryStyle {
                icon: "fa-bag-shopping",
                color: "bg-purple-100 text-purple-600",
                border: "border-purple-200",
            },
            Self::Nature => CategoryStyle {
                icon: "fa-tree",
                color: "bg-green-100 text-green-600",
                border: "border-green-200",
            },
            Self::Relax => CategoryStyle {
                icon: "fa-spa",
                color: "bg-teal-100 text-teal-600",
                border: "border-teal-200",
            },
            Self::Entertainment => CategoryStyle {
                icon: "fa-masks-theater",
                color: "bg-red-100 text-red-600",
                border: "border-red-200",
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_str(&raw).unwrap_or_default())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

// Debug elides the raw bytes.
impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub location: String,
    pub date: NaiveDateTime,
    pub category: Category,
    pub description: String,
    #[serde(default)]
    pub photo: Option<Photo>,
}

impl Stop {
    #[must_use]
    pub fn new(
        location: impl Into<String>,
        date: NaiveDateTime,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: StopId::generate(),
            location: location.into(),
            date,
            category,
            description: description.into(),
            photo: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub name: String,
    pub description: String,
    pub stops: Vec<Stop>,
}

impl Trip {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: TripId::generate(),
            name: DEFAULT_TRIP_NAME.to_string(),
            description: String::new(),
            stops: Vec::new(),
        }
    }

    #[must_use]
    pub fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.iter().find(|stop| &stop.id == id)
    }

    /// Stable, so stops sharing a timestamp keep their insertion order.
    pub fn sort_stops(&mut self) {
        self.stops.sort_by_key(|stop| stop.date);
    }
}

impl Default for Trip {
    fn default() -> Self {
        Self::new()
    }
}

#[must_use]
pub fn minute_precision(date: NaiveDateTime) -> NaiveDateTime {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date)
}

#[must_use]
pub fn now_minute() -> NaiveDateTime {
    minute_precision(chrono::Local::now().naive_local())
}

/// Inclusive day span between the earliest and latest stop. A single
/// stop (or none) counts as one day, as does a span within the same
/// 24 hours; a span of exactly 24 hours counts as two.
#[must_use]
pub fn trip_duration_label(stops: &[Stop]) -> String {
    if stops.len() < 2 {
        return "1 Day".to_string();
    }

    let first = stops.iter().map(|stop| stop.date).min();
    let last = stops.iter().map(|stop| stop.date).max();
    let (Some(first), Some(last)) = (first, last) else {
        return "1 Day".to_string();
    };

    let span_ms = (last - first).num_milliseconds().unsigned_abs();
    let days = span_ms.div_ceil(MS_PER_DAY) + 1;
    format!("{days} Day{}", if days == 1 { "" } else { "s" })
}

#[must_use]
pub fn format_stop_date(date: NaiveDateTime) -> String {
    date.format("%a, %b %-d").to_string()
}

#[must_use]
pub fn format_stop_time(date: NaiveDateTime) -> String {
    date.format("%I:%M %p").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldFocus {
    #[default]
    None,
    Desktop,
    Mobile,
}

/// One logical input rendered on two responsive surfaces. The surface
/// that currently holds focus wins; the desktop value is authoritative
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncedField {
    pub desktop: String,
    pub mobile: String,
    pub focus: FieldFocus,
}

impl SyncedField {
    #[must_use]
    pub fn uniform(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            desktop: value.clone(),
            mobile: value,
            focus: FieldFocus::None,
        }
    }

    #[must_use]
    pub fn resolve(&self) -> &str {
        match self.focus {
            FieldFocus::Mobile => &self.mobile,
            FieldFocus::Desktop | FieldFocus::None => &self.desktop,
        }
    }
}

/// How the form's photo widget was left at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhotoField {
    /// The widget was not engaged; an existing photo survives the edit.
    #[default]
    Unchanged,
    Cleared,
    /// Use the photo staged in the model by `PhotoPicked`.
    Staged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopForm {
    pub location: String,
    pub date: NaiveDateTime,
    pub category: Category,
    pub description: String,
    pub photo: PhotoField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDraft {
    pub editing: Option<StopId>,
    pub location: String,
    pub date: NaiveDateTime,
    pub category: Category,
    pub description: String,
    pub photo: Option<Photo>,
}

impl StopDraft {
    #[must_use]
    pub fn blank(date: NaiveDateTime) -> Self {
        Self {
            editing: None,
            location: String::new(),
            date,
            category: Category::default(),
            description: String::new(),
            photo: None,
        }
    }

    #[must_use]
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            editing: Some(stop.id.clone()),
            location: stop.location.clone(),
            date: stop.date,
            category: stop.category,
            description: stop.description.clone(),
            photo: stop.photo.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            duration_ms: TOAST_DURATION_MS,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            duration_ms: TOAST_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    #[default]
    Loading,
    Ready,
}

impl AppState {
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub state: AppState,
    pub store: TripStore,
    pub staged_photo: Option<Photo>,
    pub stop_form: Option<StopDraft>,
    pub active_toast: Option<ToastMessage>,
    pub is_exporting: bool,
    pub scroll_epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Noop,

    AppStarted,
    StoreLoaded {
        result: StorageResult,
    },
    LastTripLoaded {
        result: StorageResult,
    },
    StorePersisted {
        result: StorageResult,
    },

    CreateTripRequested,
    DeleteTripRequested,
    DeleteTripConfirmed {
        confirmed: bool,
    },
    TripSelected {
        id: TripId,
    },
    TripMetaEdited {
        name: SyncedField,
        description: SyncedField,
    },

    OpenStopForm {
        stop_id: Option<StopId>,
    },
    CloseStopForm,
    PhotoPicked {
        #[serde(with = "serde_bytes")]
        bytes: Vec<u8>,
    },
    ClearStagedPhoto,
    StopSubmitted {
        stop_id: Option<StopId>,
        form: StopForm,
    },
    DeleteStopRequested {
        stop_id: StopId,
    },
    DeleteStopConfirmed {
        stop_id: StopId,
        confirmed: bool,
    },

    TemplateRequested {
        template: TripTemplate,
    },
    TemplateConfirmed {
        template: TripTemplate,
        confirmed: bool,
    },

    ExportRequested,
    ExportCompleted {
        result: ExportResult,
    },

    DismissToast,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted => "app_started",
            Self::StoreLoaded { .. } => "store_loaded",
            Self::LastTripLoaded { .. } => "last_trip_loaded",
            Self::StorePersisted { .. } => "store_persisted",
            Self::CreateTripRequested => "create_trip_requested",
            Self::DeleteTripRequested => "delete_trip_requested",
            Self::DeleteTripConfirmed { .. } => "delete_trip_confirmed",
            Self::TripSelected { .. } => "trip_selected",
            Self::TripMetaEdited { .. } => "trip_meta_edited",
            Self::OpenStopForm { .. } => "open_stop_form",
            Self::CloseStopForm => "close_stop_form",
            Self::PhotoPicked { .. } => "photo_picked",
            Self::ClearStagedPhoto => "clear_staged_photo",
            Self::StopSubmitted { .. } => "stop_submitted",
            Self::DeleteStopRequested { .. } => "delete_stop_requested",
            Self::DeleteStopConfirmed { .. } => "delete_stop_confirmed",
            Self::TemplateRequested { .. } => "template_requested",
            Self::TemplateConfirmed { .. } => "template_confirmed",
            Self::ExportRequested => "export_requested",
            Self::ExportCompleted { .. } => "export_completed",
            Self::DismissToast => "dismiss_toast",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::CreateTripRequested
                | Self::DeleteTripRequested
                | Self::TripSelected { .. }
                | Self::TripMetaEdited { .. }
                | Self::OpenStopForm { .. }
                | Self::CloseStopForm
                | Self::PhotoPicked { .. }
                | Self::ClearStagedPhoto
                | Self::StopSubmitted { .. }
                | Self::DeleteStopRequested { .. }
                | Self::TemplateRequested { .. }
                | Self::ExportRequested
                | Self::DismissToast
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripTab {
    pub id: String,
    pub label: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub stops: usize,
    pub duration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoView {
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl From<&Photo> for PhotoView {
    fn from(photo: &Photo) -> Self {
        Self {
            mime_type: photo.mime_type.clone(),
            data: photo.data.clone(),
            width: photo.width,
            height: photo.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineCard {
    pub id: String,
    pub location: String,
    pub date_label: String,
    pub time_label: String,
    pub category_label: String,
    pub style: CategoryStyle,
    pub description: String,
    pub photo: Option<PhotoView>,
    pub side: CardSide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopFormView {
    pub title: String,
    pub stop_id: Option<String>,
    pub location: String,
    pub date: NaiveDateTime,
    pub category: Category,
    pub description: String,
    pub photo: Option<PhotoView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(toast: &ToastMessage) -> Self {
        Self {
            message: toast.message.clone(),
            kind: toast.kind,
            duration_ms: toast.duration_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub is_loading: bool,
    pub tabs: Vec<TripTab>,
    pub trip_name: String,
    pub trip_description: String,
    pub stats: StatsView,
    pub timeline: Vec<TimelineCard>,
    pub show_empty_state: bool,
    pub stop_form: Option<StopFormView>,
    pub staged_photo: Option<PhotoView>,
    pub toast: Option<ToastView>,
    pub is_exporting: bool,
    pub scroll_epoch: u64,
}

pub mod app {
    use super::*;
    use crate::capabilities::{
        export_filename, Capabilities, ExportDocument, ExportStats, StorageKey, StorageOutput,
    };
    use crate::image_processing::{self, ProcessingConfig};
    use tracing::{debug, warn};

    #[derive(Default)]
    pub struct App;

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
            debug!(
                event = event.name(),
                user_initiated = event.is_user_initiated(),
                "handling event"
            );

            match event {
                Event::Noop => {}

                Event::AppStarted => {
                    model.state = AppState::Loading;
                    caps.storage
                        .read(StorageKey::Trips, |result| Event::StoreLoaded { result });
                    caps.render.render();
                }

                Event::StoreLoaded { result } => {
                    match result {
                        Ok(StorageOutput::Read(Some(bytes))) => match decode_trips(&bytes) {
                            Ok(trips) => model.store.replace_trips(trips),
                            Err(error) => {
                                warn!(error = %error, "stored trip data could not be decoded");
                                model.active_toast =
                                    Some(ToastMessage::error(error.user_facing_message()));
                            }
                        },
                        Ok(StorageOutput::Read(None)) => {}
                        Ok(StorageOutput::Written) => {
                            warn!("unexpected write acknowledgement while loading");
                        }
                        Err(error) => {
                            warn!(error = %error, "stored trip data could not be read");
                        }
                    }

                    if model.store.is_empty() {
                        model.state = AppState::Ready;
                        Self::create_trip(model, caps);
                        caps.render.render();
                    } else {
                        caps.storage.read(StorageKey::LastAccessedTrip, |result| {
                            Event::LastTripLoaded { result }
                        });
                    }
                }

                Event::LastTripLoaded { result } => {
                    let last_accessed = match result {
                        Ok(StorageOutput::Read(Some(bytes))) => {
                            String::from_utf8(bytes).ok().map(TripId::new)
                        }
                        Ok(_) => None,
                        Err(error) => {
                            warn!(error = %error, "last accessed trip id could not be read");
                            None
                        }
                    };
                    model.store.select_initial(last_accessed);
                    model.state = AppState::Ready;
                    caps.render.render();
                }

                Event::StorePersisted { result } => {
                    if let Err(error) = result {
                        warn!(error = %error, "persisting to local storage failed");
                        // The in-memory mutation stands; the next save retries
                        // the same payload until the user removes data.
                        model.active_toast = Some(ToastMessage::error(
                            AppError::from(error).user_facing_message(),
                        ));
                        caps.render.render();
                    }
                }

                Event::CreateTripRequested => {
                    Self::create_trip(model, caps);
                    caps.render.render();
                }

                Event::DeleteTripRequested => {
                    caps.dialog.confirm(DELETE_TRIP_PROMPT, |confirmed| {
                        Event::DeleteTripConfirmed { confirmed }
                    });
                }

                Event::DeleteTripConfirmed { confirmed } => {
                    if !confirmed {
                        return;
                    }
                    let current = model.store.delete_current();
                    Self::persist_trips(model, caps);
                    Self::persist_last_trip(&current, caps);
                    caps.render.render();
                }

                Event::TripSelected { id } => {
                    if model.store.switch_to(&id) {
                        Self::persist_last_trip(&id, caps);
                        model.scroll_epoch = model.scroll_epoch.wrapping_add(1);
                        caps.render.render();
                    }
                }

                Event::TripMetaEdited { name, description } => {
                    if model
                        .store
                        .update_current_meta(name.resolve(), description.resolve())
                    {
                        Self::persist_trips(model, caps);
                        caps.render.render();
                    }
                }

                Event::OpenStopForm { stop_id } => {
                    model.staged_photo = None;
                    model.stop_form = match stop_id {
                        None => Some(StopDraft::blank(now_minute())),
                        Some(id) => {
                            let Some(stop) =
                                model.store.current().and_then(|trip| trip.stop(&id))
                            else {
                                return;
                            };
                            Some(StopDraft::from_stop(stop))
                        }
                    };
                    caps.render.render();
                }

                Event::CloseStopForm => {
                    model.stop_form = None;
                    model.staged_photo = None;
                    caps.render.render();
                }

                Event::PhotoPicked { bytes } => {
                    match image_processing::process_photo(&bytes, &ProcessingConfig::default()) {
                        Ok(photo) => model.staged_photo = Some(photo),
                        Err(error) => {
                            warn!(error = %error, "selected photo could not be processed");
                            model.staged_photo = None;
                        }
                    }
                    caps.render.render();
                }

                Event::ClearStagedPhoto => {
                    model.staged_photo = None;
                    if let Some(draft) = &mut model.stop_form {
                        draft.photo = None;
                    }
                    caps.render.render();
                }

                Event::StopSubmitted { stop_id, form } => {
                    let staged = model.staged_photo.take();
                    if model.store.upsert_stop(stop_id.as_ref(), form, staged) {
                        model.stop_form = None;
                        model.active_toast = Some(ToastMessage::success(STOP_SAVED_TOAST));
                        Self::persist_trips(model, caps);
                        caps.render.render();
                    }
                }

                Event::DeleteStopRequested { stop_id } => {
                    caps.dialog.confirm(DELETE_STOP_PROMPT, move |confirmed| {
                        Event::DeleteStopConfirmed { stop_id, confirmed }
                    });
                }

                Event::DeleteStopConfirmed { stop_id, confirmed } => {
                    if confirmed && model.store.delete_stop(&stop_id) {
                        Self::persist_trips(model, caps);
                        caps.render.render();
                    }
                }

                Event::TemplateRequested { template } => {
                    caps.dialog.confirm(LOAD_TEMPLATE_PROMPT, move |confirmed| {
                        Event::TemplateConfirmed {
                            template,
                            confirmed,
                        }
                    });
                }

                Event::TemplateConfirmed {
                    template,
                    confirmed,
                } => {
                    if !confirmed {
                        return;
                    }
                    if model.store.apply_template(template, now_minute()) {
                        model.active_toast = Some(ToastMessage::success(TEMPLATE_LOADED_TOAST));
                        Self::persist_trips(model, caps);
                        caps.render.render();
                    } else {
                        warn!("template load requested without a current trip");
                    }
                }

                Event::ExportRequested => {
                    let Some(trip) = model.store.current() else {
                        warn!("export requested without a current trip");
                        return;
                    };
                    let document = Self::build_export_document(trip);
                    model.is_exporting = true;
                    caps.export
                        .pdf(document, |result| Event::ExportCompleted { result });
                    caps.render.render();
                }

                Event::ExportCompleted { result } => {
                    model.is_exporting = false;
                    match result {
                        Ok(_) => {
                            model.active_toast = Some(ToastMessage::success(EXPORTED_TOAST));
                        }
                        Err(error) => {
                            warn!(error = %error, "pdf export failed");
                            model.active_toast = Some(ToastMessage::error(
                                AppError::from(error).user_facing_message(),
                            ));
                        }
                    }
                    caps.render.render();
                }

                Event::DismissToast => {
                    model.active_toast = None;
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Self::Model) -> Self::ViewModel {
            let tabs = model
                .store
                .trips()
                .iter()
                .map(|trip| TripTab {
                    id: trip.id.as_str().to_string(),
                    label: trip.name.clone(),
                    is_current: model.store.current_id() == Some(&trip.id),
                })
                .collect();

            let current = model.store.current();

            let trip_name = current
                .map(|trip| {
                    if trip.name.is_empty() {
                        UNTITLED_TRIP_NAME.to_string()
                    } else {
                        trip.name.clone()
                    }
                })
                .unwrap_or_default();
            let trip_description = current
                .map(|trip| trip.description.clone())
                .unwrap_or_default();

            let stats = StatsView {
                stops: current.map_or(0, |trip| trip.stops.len()),
                duration: current
                    .map_or_else(|| "1 Day".to_string(), |trip| trip_duration_label(&trip.stops)),
            };

            // Chronological order is re-derived on every projection.
            let mut ordered: Vec<&Stop> = current
                .map(|trip| trip.stops.iter().collect())
                .unwrap_or_default();
            ordered.sort_by_key(|stop| stop.date);

            let timeline: Vec<TimelineCard> = ordered
                .iter()
                .enumerate()
                .map(|(index, stop)| TimelineCard {
                    id: stop.id.as_str().to_string(),
                    location: stop.location.clone(),
                    date_label: format_stop_date(stop.date),
                    time_label: format_stop_time(stop.date),
                    category_label: stop.category.label(),
                    style: stop.category.style(),
                    description: stop.description.clone(),
                    photo: stop.photo.as_ref().map(PhotoView::from),
                    side: if index % 2 == 0 {
                        CardSide::Left
                    } else {
                        CardSide::Right
                    },
                })
                .collect();

            let stop_form = model.stop_form.as_ref().map(|draft| StopFormView {
                title: if draft.editing.is_some() {
                    EDIT_STOP_FORM_TITLE.to_string()
                } else {
                    NEW_STOP_FORM_TITLE.to_string()
                },
                stop_id: draft.editing.as_ref().map(|id| id.as_str().to_string()),
                location: draft.location.clone(),
                date: draft.date,
                category: draft.category,
                description: draft.description.clone(),
                photo: model
                    .staged_photo
                    .as_ref()
                    .or_else(|| draft.photo.as_ref())
                    .map(PhotoView::from),
            });

            ViewModel {
                is_loading: !model.state.is_ready(),
                tabs,
                trip_name,
                trip_description,
                stats,
                show_empty_state: timeline.is_empty(),
                timeline,
                stop_form,
                staged_photo: model.staged_photo.as_ref().map(PhotoView::from),
                toast: model.active_toast.as_ref().map(ToastView::from),
                is_exporting: model.is_exporting,
                scroll_epoch: model.scroll_epoch,
            }
        }
    }

    impl App {
        fn create_trip(model: &mut Model, caps: &Capabilities) {
            let id = model.store.create_trip();
            Self::persist_trips(model, caps);
            Self::persist_last_trip(&id, caps);
        }

        fn persist_trips(model: &mut Model, caps: &Capabilities) {
            match encode_trips(model.store.trips()) {
                Ok(bytes) => {
                    caps.storage.write(StorageKey::Trips, bytes, |result| {
                        Event::StorePersisted { result }
                    });
                }
                Err(error) => {
                    warn!(error = %error, "trip list could not be serialized");
                    model.active_toast = Some(ToastMessage::error(error.user_facing_message()));
                }
            }
        }

        fn persist_last_trip(id: &TripId, caps: &Capabilities) {
            caps.storage.write(
                StorageKey::LastAccessedTrip,
                id.as_str().as_bytes().to_vec(),
                |result| Event::StorePersisted { result },
            );
        }

        fn build_export_document(trip: &Trip) -> ExportDocument {
            let title = if trip.name.is_empty() {
                UNTITLED_EXPORT_TITLE.to_string()
            } else {
                trip.name.clone()
            };
            let description = if trip.description.is_empty() {
                NO_DESCRIPTION_FALLBACK.to_string()
            } else {
                trip.description.clone()
            };
            ExportDocument {
                filename: export_filename(&title),
                title,
                description,
                stats: ExportStats {
                    stops: trip.stops.len(),
                    duration: trip_duration_label(&trip.stops),
                },
            }
        }
    }

    fn encode_trips(trips: &[Trip]) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&trips, &mut buffer).map_err(|e| {
            AppError::new(ErrorKind::Serialization, "trip list serialization failed")
                .with_internal(e.to_string())
        })?;
        Ok(buffer)
    }

    fn decode_trips(bytes: &[u8]) -> Result<Vec<Trip>, AppError> {
        ciborium::de::from_reader(bytes).map_err(|e| {
            AppError::new(ErrorKind::Deserialization, "trip list deserialization failed")
                .with_internal(e.to_string())
        })
    }
}
