//! Canned itineraries. Loading one overwrites the current trip's name,
//! description, and stops; timestamps are laid out relative to the
//! moment the template is applied.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Category, Stop};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripTemplate {
    ParisGetaway,
    PacificCoastHighway,
}

impl TripTemplate {
    pub const ALL: [Self; 2] = [Self::ParisGetaway, Self::PacificCoastHighway];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ParisGetaway => "Paris Getaway",
            Self::PacificCoastHighway => "Pacific Coast Hwy",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ParisGetaway => "Croissants, art, and city lights. 3-day budget: €1500.",
            Self::PacificCoastHighway => {
                "Sun, sea, and open roads. Must pack sunscreen and a good playlist."
            }
        }
    }

    #[must_use]
    pub fn stops(self, now: NaiveDateTime) -> Vec<Stop> {
        let day_two = now + Duration::days(1);
        match self {
            Self::ParisGetaway => vec![
                Stop::new(
                    "Arrival at CDG",
                    now,
                    Category::Transport,
                    "Take RER B to Châtelet.",
                ),
                Stop::new(
                    "Hotel check-in",
                    now + Duration::hours(2),
                    Category::Lodging,
                    "Le Marais Boutique Hotel. Confirmation #ABC123.",
                ),
                Stop::new(
                    "Eiffel Tower View",
                    now + Duration::hours(5),
                    Category::Sightseeing,
                    "Book tickets online 30 days ahead.",
                ),
                Stop::new(
                    "Dinner Seine Cruise",
                    now + Duration::hours(8),
                    Category::Food,
                    "Sunset boat ride with wine. Reservation: 7 PM.",
                ),
                Stop::new(
                    "Louvre Museum",
                    day_two,
                    Category::Sightseeing,
                    "Mona Lisa visit. Must arrive before 10 AM.",
                ),
            ],
            Self::PacificCoastHighway => vec![
                Stop::new(
                    "Start: SF Golden Gate",
                    now,
                    Category::Transport,
                    "Begin journey driving south on CA-1.",
                ),
                Stop::new(
                    "Muir Woods",
                    now + Duration::hours(3),
                    Category::Nature,
                    "Giant Redwoods hike. Need reservation for parking.",
                ),
                Stop::new(
                    "Big Sur Camping",
                    now + Duration::hours(8),
                    Category::Lodging,
                    "Campsite #14. Check in by 9 PM.",
                ),
            ],
        }
    }
}
