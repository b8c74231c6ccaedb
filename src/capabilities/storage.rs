//! Persistent key-value storage capability. The shell backs it with the
//! browser's local storage (or an equivalent store on other platforms).
//! Exactly two keys exist: the serialized trip list and the id of the
//! last accessed trip.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKey {
    Trips,
    LastAccessedTrip,
}

impl StorageKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trips => crate::TRIPS_STORAGE_KEY,
            Self::LastAccessedTrip => crate::LAST_TRIP_STORAGE_KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOperation {
    Read {
        key: StorageKey,
    },
    Write {
        key: StorageKey,
        #[serde(with = "serde_bytes")]
        value: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageOutput {
    Read(#[serde(with = "serde_bytes")] Option<Vec<u8>>),
    Written,
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("storage write failed: {reason}")]
    WriteFailed { reason: String },

    #[error("storage backend unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StorageError {
    #[must_use]
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        let kind = if e.is_quota() {
            ErrorKind::QuotaExceeded
        } else {
            ErrorKind::Storage
        };
        AppError::new(kind, e.to_string())
    }
}

pub type StorageResult = Result<StorageOutput, StorageError>;

impl Operation for StorageOperation {
    type Output = StorageResult;
}

pub struct Storage<Ev> {
    context: CapabilityContext<StorageOperation, Ev>,
}

impl<Ev> Capability<Ev> for Storage<Ev> {
    type Operation = StorageOperation;
    type MappedSelf<MappedEv> = Storage<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Storage::new(self.context.map_event(f))
    }
}

impl<Ev> Storage<Ev> {
    #[must_use]
    pub fn new(context: CapabilityContext<StorageOperation, Ev>) -> Self {
        Self { context }
    }
}

impl<Ev> Storage<Ev>
where
    Ev: Send + 'static,
{
    pub fn read<F>(&self, key: StorageKey, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let response = context
                .request_from_shell(StorageOperation::Read { key })
                .await;
            context.update_app(make_event(response));
        });
    }

    pub fn write<F>(&self, key: StorageKey, value: Vec<u8>, make_event: F)
    where
        F: FnOnce(StorageResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let response = context
                .request_from_shell(StorageOperation::Write { key, value })
                .await;
            context.update_app(make_event(response));
        });
    }
}
