//! The single owned container for all trip state. Mutations that the UI
//! can trigger live here as explicit methods so they stay testable
//! without any shell attached.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::templates::TripTemplate;
use crate::{
    minute_precision, Photo, PhotoField, Stop, StopForm, StopId, Trip, TripId, UNTITLED_TRIP_NAME,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripStore {
    trips: Vec<Trip>,
    current_trip_id: Option<TripId>,
}

impl TripStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    #[must_use]
    pub fn current_id(&self) -> Option<&TripId> {
        self.current_trip_id.as_ref()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Trip> {
        let id = self.current_trip_id.as_ref()?;
        self.trips.iter().find(|trip| &trip.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &TripId) -> bool {
        self.trips.iter().any(|trip| &trip.id == id)
    }

    fn current_mut(&mut self) -> Option<&mut Trip> {
        let id = self.current_trip_id.clone()?;
        self.trips.iter_mut().find(|trip| trip.id == id)
    }

    /// Replaces the whole list, e.g. after restoring from storage. The
    /// caller picks a current trip afterwards via [`Self::select_initial`].
    pub fn replace_trips(&mut self, trips: Vec<Trip>) {
        self.trips = trips;
        self.current_trip_id = None;
    }

    /// Chooses the startup trip: the last accessed one when it still
    /// exists, the first trip otherwise.
    pub fn select_initial(&mut self, last_accessed: Option<TripId>) {
        self.current_trip_id = last_accessed
            .filter(|id| self.contains(id))
            .or_else(|| self.trips.first().map(|trip| trip.id.clone()));
    }

    /// Inserts a fresh trip at the front of the list and makes it current.
    pub fn create_trip(&mut self) -> TripId {
        let trip = Trip::new();
        let id = trip.id.clone();
        self.trips.insert(0, trip);
        self.current_trip_id = Some(id.clone());
        id
    }

    /// Removes the current trip and returns the id that is current
    /// afterwards. The store is never left empty: deleting the last trip
    /// immediately creates a replacement.
    pub fn delete_current(&mut self) -> TripId {
        if let Some(current) = self.current_trip_id.take() {
            self.trips.retain(|trip| trip.id != current);
        }

        if self.trips.is_empty() {
            self.create_trip()
        } else {
            let first = self.trips[0].id.clone();
            self.current_trip_id = Some(first.clone());
            first
        }
    }

    pub fn switch_to(&mut self, id: &TripId) -> bool {
        if self.contains(id) {
            self.current_trip_id = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Writes reconciled name/description back to the current trip. An
    /// empty name falls back to the untitled placeholder.
    pub fn update_current_meta(&mut self, name: &str, description: &str) -> bool {
        let Some(trip) = self.current_mut() else {
            return false;
        };
        trip.name = if name.is_empty() {
            UNTITLED_TRIP_NAME.to_string()
        } else {
            name.to_string()
        };
        trip.description = description.to_string();
        true
    }

    /// Insert when `stop_id` is absent, merge-in-place when present.
    /// Merging preserves the stop id and, for `PhotoField::Unchanged`,
    /// the existing photo. Editing an id that no longer exists leaves the
    /// list untouched. Returns false only when there is no current trip.
    pub fn upsert_stop(
        &mut self,
        stop_id: Option<&StopId>,
        form: StopForm,
        staged: Option<Photo>,
    ) -> bool {
        let Some(trip) = self.current_mut() else {
            return false;
        };

        let date = minute_precision(form.date);
        match stop_id {
            Some(id) => {
                if let Some(stop) = trip.stops.iter_mut().find(|stop| &stop.id == id) {
                    stop.location = form.location;
                    stop.date = date;
                    stop.category = form.category;
                    stop.description = form.description;
                    match form.photo {
                        PhotoField::Unchanged => {}
                        PhotoField::Cleared => stop.photo = None,
                        PhotoField::Staged => stop.photo = staged,
                    }
                }
            }
            None => {
                let photo = match form.photo {
                    PhotoField::Staged => staged,
                    PhotoField::Unchanged | PhotoField::Cleared => None,
                };
                trip.stops.push(Stop {
                    id: StopId::generate(),
                    location: form.location,
                    date,
                    category: form.category,
                    description: form.description,
                    photo,
                });
            }
        }

        trip.sort_stops();
        true
    }

    pub fn delete_stop(&mut self, id: &StopId) -> bool {
        let Some(trip) = self.current_mut() else {
            return false;
        };
        trip.stops.retain(|stop| &stop.id != id);
        true
    }

    /// Destructively replaces the current trip's name, description, and
    /// stops with the template's canned itinerary.
    pub fn apply_template(&mut self, template: TripTemplate, now: NaiveDateTime) -> bool {
        let Some(trip) = self.current_mut() else {
            return false;
        };
        trip.name = template.title().to_string();
        trip.description = template.description().to_string();
        trip.stops = template.stops(now);
        trip.sort_stops();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn dt(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn form(location: &str, date: NaiveDateTime, photo: PhotoField) -> StopForm {
        StopForm {
            location: location.into(),
            date,
            category: Category::Sightseeing,
            description: String::new(),
            photo,
        }
    }

    fn photo(tag: u8) -> Photo {
        Photo {
            mime_type: "image/jpeg".into(),
            data: vec![tag; 16],
            width: 4,
            height: 4,
        }
    }

    #[test]
    fn create_trip_inserts_at_front_and_selects_it() {
        let mut store = TripStore::new();
        let first = store.create_trip();
        let second = store.create_trip();

        assert_eq!(store.len(), 2);
        assert_eq!(store.trips()[0].id, second);
        assert_eq!(store.trips()[1].id, first);
        assert_eq!(store.current_id(), Some(&second));
        assert_eq!(store.current().unwrap().name, "New Adventure");
        assert!(store.current().unwrap().stops.is_empty());
    }

    #[test]
    fn deleting_the_last_trip_creates_a_replacement() {
        let mut store = TripStore::new();
        let only = store.create_trip();
        let replacement = store.delete_current();

        assert_eq!(store.len(), 1);
        assert_ne!(only, replacement);
        assert_eq!(store.current_id(), Some(&replacement));
    }

    #[test]
    fn deleting_selects_the_first_remaining_trip() {
        let mut store = TripStore::new();
        let oldest = store.create_trip();
        let newest = store.create_trip();
        assert_eq!(store.current_id(), Some(&newest));

        let current = store.delete_current();
        assert_eq!(store.len(), 1);
        assert_eq!(current, oldest);
        assert_eq!(store.current_id(), Some(&oldest));
    }

    #[test]
    fn switch_to_rejects_unknown_ids() {
        let mut store = TripStore::new();
        let id = store.create_trip();
        assert!(!store.switch_to(&TripId::new("nope")));
        assert_eq!(store.current_id(), Some(&id));
    }

    #[test]
    fn select_initial_prefers_last_accessed_when_present() {
        let mut store = TripStore::new();
        let old = store.create_trip();
        let new = store.create_trip();

        store.select_initial(Some(old.clone()));
        assert_eq!(store.current_id(), Some(&old));

        store.select_initial(Some(TripId::new("gone")));
        assert_eq!(store.current_id(), Some(&new));

        store.select_initial(None);
        assert_eq!(store.current_id(), Some(&new));
    }

    #[test]
    fn meta_update_falls_back_to_untitled() {
        let mut store = TripStore::new();
        store.create_trip();

        assert!(store.update_current_meta("", "notes"));
        assert_eq!(store.current().unwrap().name, UNTITLED_TRIP_NAME);
        assert_eq!(store.current().unwrap().description, "notes");

        assert!(store.update_current_meta("Summer", ""));
        assert_eq!(store.current().unwrap().name, "Summer");
    }

    #[test]
    fn insert_keeps_stops_sorted_by_date() {
        let mut store = TripStore::new();
        store.create_trip();

        store.upsert_stop(None, form("C", dt(3, 9, 0), PhotoField::Unchanged), None);
        store.upsert_stop(None, form("A", dt(1, 9, 0), PhotoField::Unchanged), None);
        store.upsert_stop(None, form("B", dt(2, 9, 0), PhotoField::Unchanged), None);

        let locations: Vec<&str> = store
            .current()
            .unwrap()
            .stops
            .iter()
            .map(|stop| stop.location.as_str())
            .collect();
        assert_eq!(locations, ["A", "B", "C"]);
    }

    #[test]
    fn upsert_merge_preserves_untouched_photo() {
        let mut store = TripStore::new();
        store.create_trip();
        store.upsert_stop(
            None,
            form("Museum", dt(1, 9, 0), PhotoField::Staged),
            Some(photo(1)),
        );
        let id = store.current().unwrap().stops[0].id.clone();

        // Editing the location without engaging the photo widget.
        store.upsert_stop(
            Some(&id),
            form("Gallery", dt(1, 10, 0), PhotoField::Unchanged),
            None,
        );

        let stop = store.current().unwrap().stop(&id).unwrap();
        assert_eq!(stop.location, "Gallery");
        assert_eq!(stop.date, dt(1, 10, 0));
        assert_eq!(stop.photo, Some(photo(1)));
    }

    #[test]
    fn upsert_merge_can_clear_or_replace_photo() {
        let mut store = TripStore::new();
        store.create_trip();
        store.upsert_stop(
            None,
            form("Museum", dt(1, 9, 0), PhotoField::Staged),
            Some(photo(1)),
        );
        let id = store.current().unwrap().stops[0].id.clone();

        store.upsert_stop(
            Some(&id),
            form("Museum", dt(1, 9, 0), PhotoField::Staged),
            Some(photo(2)),
        );
        assert_eq!(
            store.current().unwrap().stop(&id).unwrap().photo,
            Some(photo(2))
        );

        store.upsert_stop(
            Some(&id),
            form("Museum", dt(1, 9, 0), PhotoField::Cleared),
            None,
        );
        assert_eq!(store.current().unwrap().stop(&id).unwrap().photo, None);
    }

    #[test]
    fn upsert_with_unknown_id_leaves_stops_untouched() {
        let mut store = TripStore::new();
        store.create_trip();
        store.upsert_stop(None, form("Museum", dt(1, 9, 0), PhotoField::Unchanged), None);

        assert!(store.upsert_stop(
            Some(&StopId::new("gone")),
            form("Ghost", dt(2, 9, 0), PhotoField::Unchanged),
            None,
        ));
        let stops = &store.current().unwrap().stops;
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].location, "Museum");
    }

    #[test]
    fn upsert_truncates_dates_to_minute_precision() {
        let mut store = TripStore::new();
        store.create_trip();
        let with_seconds = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 45)
            .unwrap();
        store.upsert_stop(None, form("Museum", with_seconds, PhotoField::Unchanged), None);
        assert_eq!(store.current().unwrap().stops[0].date, dt(1, 9, 30));
    }

    #[test]
    fn delete_stop_removes_only_that_stop() {
        let mut store = TripStore::new();
        store.create_trip();
        store.upsert_stop(None, form("A", dt(1, 9, 0), PhotoField::Unchanged), None);
        store.upsert_stop(None, form("B", dt(2, 9, 0), PhotoField::Unchanged), None);
        let id = store.current().unwrap().stops[0].id.clone();

        assert!(store.delete_stop(&id));
        let stops = &store.current().unwrap().stops;
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].location, "B");
    }

    #[test]
    fn template_replaces_meta_and_stops_atomically() {
        let mut store = TripStore::new();
        store.create_trip();
        store.upsert_stop(None, form("Leftover", dt(1, 9, 0), PhotoField::Unchanged), None);
        store.update_current_meta("Old name", "Old description");

        assert!(store.apply_template(TripTemplate::ParisGetaway, dt(1, 8, 0)));

        let trip = store.current().unwrap();
        assert_eq!(trip.name, "Paris Getaway");
        assert_eq!(trip.stops.len(), 5);
        assert!(trip.stops.iter().all(|stop| stop.location != "Leftover"));
    }

    #[test]
    fn mutations_without_a_current_trip_are_no_ops() {
        let mut store = TripStore::new();
        assert!(!store.update_current_meta("x", "y"));
        assert!(!store.upsert_stop(None, form("A", dt(1, 9, 0), PhotoField::Unchanged), None));
        assert!(!store.delete_stop(&StopId::new("x")));
        assert!(!store.apply_template(TripTemplate::ParisGetaway, dt(1, 8, 0)));
    }

    proptest! {
        // Any sequence of create/delete/switch operations leaves the store
        // non-empty with a valid current trip.
        #[test]
        fn store_never_empty_and_current_always_valid(ops in proptest::collection::vec(0u8..3, 1..64)) {
            let mut store = TripStore::new();
            store.create_trip();

            for op in ops {
                match op {
                    0 => {
                        store.create_trip();
                    }
                    1 => {
                        store.delete_current();
                    }
                    _ => {
                        let last = store.trips().last().map(|trip| trip.id.clone());
                        if let Some(id) = last {
                            store.switch_to(&id);
                        }
                    }
                }

                prop_assert!(!store.is_empty());
                let current = store.current_id().cloned();
                prop_assert!(current.is_some_and(|id| store.contains(&id)));
            }
        }
    }
}
