//! Closed category enumerations and entity ids for the home model.
//!
//! Raw dataset strings are resolved into these enums once, at
//! configuration-load time. Downstream code never touches raw category
//! strings again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a physical sensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Battery,
    Door,
    LightSwitch,
    Light,
    Motion,
    WideAreaMotion,
    Temperature,
}

/// The kind of a location inside the home.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Kitchen,
    LivingRoom,
    DiningRoom,
    Bathroom,
    Bedroom,
    Entrance,
    Hallway,
    Office,
    Closet,
    Garage,
    Outside,
}

/// The kind of a hand-labeled activity annotation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Bathe,
    BedToiletTransition,
    Caregiver,
    Cook,
    CookBreakfast,
    CookLunch,
    CookDinner,
    Dress,
    Drink,
    DrugManagement,
    Eat,
    EatBreakfast,
    EatLunch,
    EatDinner,
    EnterHome,
    EntertainGuests,
    EveningMeds,
    MorningMeds,
    Groom,
    LeaveHome,
    PersonalHygiene,
    Phone,
    Read,
    Relax,
    Sleep,
    SleepOutOfBed,
    Toilet,
    WashDishes,
    WashBreakfastDishes,
    WashLunchDishes,
    WashDinnerDishes,
    WatchTv,
    WorkAtTable,
}

/// Whether an activity annotation opens, closes, or punctually marks an
/// activity occurrence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IntervalEdge {
    Begin,
    End,
    Point,
}

/// Stable index of a sensor in the home model (sensors sorted by name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SensorId(pub(crate) usize);

impl SensorId {
    /// Row of this sensor in the feature matrix and in the graph node order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable index of a location in the home model (locations sorted by name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationId(pub(crate) usize);

impl LocationId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of an activity interval in a window slice's interval arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalId(pub(crate) usize);

impl IntervalId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
