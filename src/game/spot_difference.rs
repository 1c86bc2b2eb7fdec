use serde::{Deserialize, Serialize};

use super::progress_ledger::ProgressLedger;
use super::scoring::GameRules;
use super::settings::Settings;
use crate::model::{Difficulty, Level, LevelCatalog, LevelContent, UnlockCondition};
use crate::storage::PersistenceStore;

pub const GAME_ID: &str = "spot_difference";

/// Scored by the share of differences found, with 20 seconds per difference.
pub const RULES: GameRules = GameRules::new(20);

/// Circular area, in image pixels, where the two pictures differ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferenceRegion {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl DifferenceRegion {
    pub const fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (dx, dy) = (x - self.x, y - self.y);
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePair {
    pub original: String,
    pub modified: String,
    pub differences: Vec<DifferenceRegion>,
}

impl LevelContent for ImagePair {
    fn item_count(&self) -> usize {
        self.differences.len()
    }
}

pub type SpotDifferenceLedger = ProgressLedger<ImagePair>;

fn pair(name: &str, differences: Vec<DifferenceRegion>) -> ImagePair {
    ImagePair {
        original: format!("/images/spot/{name}-original.jpg"),
        modified: format!("/images/spot/{name}-modified.jpg"),
        differences,
    }
}

pub fn catalog() -> LevelCatalog<ImagePair> {
    LevelCatalog::new(vec![
        Level::new(
            "sd-1",
            "City Park",
            Difficulty::Easy,
            pair(
                "park",
                vec![
                    DifferenceRegion::new(120.0, 80.0, 30.0),
                    DifferenceRegion::new(340.0, 210.0, 28.0),
                    DifferenceRegion::new(505.0, 95.0, 32.0),
                ],
            ),
        )
        .with_description("Three changes in a sunny park."),
        Level::new(
            "sd-2",
            "Market Street",
            Difficulty::Medium,
            pair(
                "market",
                vec![
                    DifferenceRegion::new(64.0, 300.0, 24.0),
                    DifferenceRegion::new(210.0, 140.0, 22.0),
                    DifferenceRegion::new(388.0, 52.0, 20.0),
                    DifferenceRegion::new(470.0, 330.0, 26.0),
                ],
            ),
        )
        .with_description("Four changes between the stalls.")
        .unlocked_by(UnlockCondition::Level { value: 1 })
        .with_time_limit(120),
        Level::new(
            "sd-3",
            "Gallery Wall",
            Difficulty::Hard,
            pair(
                "gallery",
                vec![
                    DifferenceRegion::new(45.0, 60.0, 16.0),
                    DifferenceRegion::new(150.0, 260.0, 14.0),
                    DifferenceRegion::new(275.0, 120.0, 15.0),
                    DifferenceRegion::new(410.0, 300.0, 18.0),
                    DifferenceRegion::new(560.0, 75.0, 14.0),
                ],
            ),
        )
        .with_description("Five small changes among the frames.")
        .unlocked_by(UnlockCondition::Score { value: 150 })
        .with_time_limit(90),
    ])
}

pub fn service(store: &PersistenceStore, settings: &Settings) -> SpotDifferenceLedger {
    ProgressLedger::from_settings(catalog(), RULES, store.namespace(GAME_ID), settings)
}

/// Index of the difference under the point, if any.
pub fn find_difference(level: &Level<ImagePair>, x: f32, y: f32) -> Option<usize> {
    level
        .content
        .differences
        .iter()
        .position(|region| region.contains(x, y))
}
