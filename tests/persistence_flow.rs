use crux_core::testing::AppTester;
use plantrip_core::capabilities::{StorageError, StorageKey, StorageOperation, StorageOutput};
use plantrip_core::{App, Effect, Event, Model, ToastKind, Trip, STORAGE_FULL_MESSAGE};

fn encode(trips: &[Trip]) -> Vec<u8> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(&trips, &mut buffer).unwrap();
    buffer
}

/// Drives `AppStarted` up to the point where the trip blob has been
/// resolved, returning the follow-up events.
fn resolve_startup_read(
    app: &AppTester<App, Effect>,
    model: &mut Model,
    stored: Option<Vec<u8>>,
) -> Vec<Event> {
    let mut update = app.update(Event::AppStarted, model);
    let read = update
        .effects
        .iter_mut()
        .find_map(|effect| match effect {
            Effect::Storage(request) => Some(request),
            _ => None,
        })
        .expect("startup should read the trip store");
    app.resolve(read, Ok(StorageOutput::Read(stored)))
        .expect("resolve trip read")
        .events
}

#[test]
fn startup_restores_trips_and_selects_last_accessed() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let mut newer = Trip::new();
    newer.name = "Alps".into();
    let mut older = Trip::new();
    older.name = "Beaches".into();
    let last_accessed = older.id.clone();
    let blob = encode(&[newer.clone(), older.clone()]);

    let events = resolve_startup_read(&app, &mut model, Some(blob));

    let mut last_read = None;
    for event in events {
        let mut follow_up = app.update(event, &mut model);
        for effect in follow_up.effects.iter_mut() {
            if let Effect::Storage(request) = effect {
                assert_eq!(
                    request.operation,
                    StorageOperation::Read {
                        key: StorageKey::LastAccessedTrip
                    }
                );
                last_read = Some(
                    app.resolve(
                        request,
                        Ok(StorageOutput::Read(Some(
                            last_accessed.as_str().as_bytes().to_vec(),
                        ))),
                    )
                    .expect("resolve last accessed read"),
                );
            }
        }
    }

    for event in last_read.expect("last accessed read issued").events {
        app.update(event, &mut model);
    }

    assert_eq!(model.store.len(), 2);
    assert_eq!(model.store.current_id(), Some(&last_accessed));
    assert_eq!(model.store.current().unwrap().name, "Beaches");
    assert!(model.state.is_ready());
}

#[test]
fn stale_last_accessed_id_falls_back_to_the_first_trip() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    let mut first = Trip::new();
    first.name = "Alps".into();
    let first_id = first.id.clone();
    let blob = encode(&[first, Trip::new()]);

    let events = resolve_startup_read(&app, &mut model, Some(blob));

    let mut last_read = None;
    for event in events {
        let mut follow_up = app.update(event, &mut model);
        for effect in follow_up.effects.iter_mut() {
            if let Effect::Storage(request) = effect {
                last_read = Some(
                    app.resolve(
                        request,
                        Ok(StorageOutput::Read(Some(b"deleted-trip-id".to_vec()))),
                    )
                    .expect("resolve last accessed read"),
                );
            }
        }
    }

    for event in last_read.expect("last accessed read issued").events {
        app.update(event, &mut model);
    }

    assert_eq!(model.store.current_id(), Some(&first_id));
}

#[test]
fn malformed_blob_toasts_and_seeds_a_default_trip() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();

    // Valid CBOR, wrong shape.
    let events = resolve_startup_read(&app, &mut model, Some(vec![0x01]));
    for event in events {
        app.update(event, &mut model);
    }

    assert_eq!(model.store.len(), 1);
    assert_eq!(model.store.trips()[0].name, "New Adventure");
    let toast = model.active_toast.as_ref().expect("error toast");
    assert_eq!(toast.kind, ToastKind::Error);
}

#[test]
fn quota_failure_toasts_without_rolling_back() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.store.create_trip();

    let mut update = app.update(Event::CreateTripRequested, &mut model);
    assert_eq!(model.store.len(), 2);

    let write = update
        .effects
        .iter_mut()
        .find_map(|effect| match effect {
            Effect::Storage(request)
                if matches!(
                    request.operation,
                    StorageOperation::Write {
                        key: StorageKey::Trips,
                        ..
                    }
                ) =>
            {
                Some(request)
            }
            _ => None,
        })
        .expect("creating a trip should persist the list");

    let update = app
        .resolve(write, Err(StorageError::QuotaExceeded))
        .expect("resolve write");
    for event in update.events {
        app.update(event, &mut model);
    }

    // The failed save is reported; the in-memory list keeps the new trip.
    let toast = model.active_toast.as_ref().expect("quota toast");
    assert_eq!(toast.message, STORAGE_FULL_MESSAGE);
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(model.store.len(), 2);
}

#[test]
fn trip_blob_roundtrips_with_photos_intact() {
    let mut trip = Trip::new();
    trip.name = "Roundtrip".into();
    let blob = encode(&[trip.clone()]);
    let decoded: Vec<Trip> = ciborium::de::from_reader(blob.as_slice()).unwrap();
    assert_eq!(decoded, vec![trip]);
}
