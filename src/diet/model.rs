use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foods::model::FoodRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    MorningSnack,
    Lunch,
    AfternoonSnack,
    Dinner,
}

pub const ALL_SLOTS: [MealSlot; 5] = [
    MealSlot::Breakfast,
    MealSlot::MorningSnack,
    MealSlot::Lunch,
    MealSlot::AfternoonSnack,
    MealSlot::Dinner,
];

/// A portioned line in a meal or recipe. Nutrient fields are absolute for
/// this portion, not per-100g; `food` is free text and may or may not match
/// a catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: Uuid,
    pub food: String,
    pub grams: f64,
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryUpdate {
    pub food: Option<String>,
    pub grams: Option<f64>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
}

impl MealEntry {
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            food: String::new(),
            grams: 0.0,
            calories: 0.0,
            proteins: 0.0,
            carbs: 0.0,
            fats: 0.0,
        }
    }

    /// Change the portion size. When a per-100g rate is derivable (there is a
    /// food name and a nonzero calorie baseline) all four nutrient fields are
    /// rescaled through the implied rate `field / max(old_grams, 1) * 100`;
    /// otherwise the absolute values are kept as-is.
    pub fn set_grams(&mut self, grams: f64) {
        if !self.food.is_empty() && self.calories > 0.0 {
            let old = if self.grams > 0.0 { self.grams } else { 1.0 };
            let scale = grams / old;
            self.calories *= scale;
            self.proteins *= scale;
            self.carbs *= scale;
            self.fats *= scale;
        }
        self.grams = grams;
    }

    /// Re-derive the nutrient fields from a catalog record's per-100g values
    /// at the current portion size.
    pub fn fill_from_record(&mut self, record: &FoodRecord) {
        let factor = self.grams / 100.0;
        self.calories = record.calories * factor;
        self.proteins = record.proteins * factor;
        self.carbs = record.carbs * factor;
        self.fats = record.fats * factor;
    }

    /// Merge a partial update. Grams changes apply the rescale rule first; a
    /// food change then re-derives nutrients when the name matches a catalog
    /// record; explicit nutrient fields always win last.
    pub fn apply(&mut self, update: &EntryUpdate, catalog: &[FoodRecord]) {
        if let Some(grams) = update.grams {
            self.set_grams(grams);
        }
        if let Some(food) = &update.food {
            self.food = food.trim().to_string();
            if let Some(record) = catalog
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(&self.food))
            {
                self.fill_from_record(record);
            }
        }
        if let Some(v) = update.calories {
            self.calories = v;
        }
        if let Some(v) = update.proteins {
            self.proteins = v;
        }
        if let Some(v) = update.carbs {
            self.carbs = v;
        }
        if let Some(v) = update.fats {
            self.fats = v;
        }
    }
}

/// Exactly five fixed slots. Stored documents may be partial; missing slots
/// deserialize as empty lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub breakfast: Vec<MealEntry>,
    #[serde(default)]
    pub morning_snack: Vec<MealEntry>,
    #[serde(default)]
    pub lunch: Vec<MealEntry>,
    #[serde(default)]
    pub afternoon_snack: Vec<MealEntry>,
    #[serde(default)]
    pub dinner: Vec<MealEntry>,
}

impl DayPlan {
    pub fn slot(&self, slot: MealSlot) -> &Vec<MealEntry> {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::MorningSnack => &self.morning_snack,
            MealSlot::Lunch => &self.lunch,
            MealSlot::AfternoonSnack => &self.afternoon_snack,
            MealSlot::Dinner => &self.dinner,
        }
    }

    pub fn slot_mut(&mut self, slot: MealSlot) -> &mut Vec<MealEntry> {
        match slot {
            MealSlot::Breakfast => &mut self.breakfast,
            MealSlot::MorningSnack => &mut self.morning_snack,
            MealSlot::Lunch => &mut self.lunch,
            MealSlot::AfternoonSnack => &mut self.afternoon_snack,
            MealSlot::Dinner => &mut self.dinner,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl MacroTotals {
    pub fn of(entries: &[MealEntry]) -> Self {
        entries.iter().fold(Self::default(), |acc, e| Self {
            calories: acc.calories + e.calories,
            proteins: acc.proteins + e.proteins,
            carbs: acc.carbs + e.carbs,
            fats: acc.fats + e.fats,
        })
    }

    /// Share of total calories contributed by each macro, in percent.
    /// Denominator pins to 1 when there are no calories.
    pub fn macro_percentages(&self) -> (f64, f64, f64) {
        let denom = if self.calories > 0.0 { self.calories } else { 1.0 };
        (
            self.carbs * 4.0 / denom * 100.0,
            self.proteins * 4.0 / denom * 100.0,
            self.fats * 9.0 / denom * 100.0,
        )
    }
}

/// Document key for a plan day: signed week offset from the current week,
/// Monday-first day index.
pub fn day_key(week: i64, day: u8) -> String {
    format!("meals/week_{week}_day_{day}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(food: &str, grams: f64, calories: f64, proteins: f64, carbs: f64, fats: f64) -> MealEntry {
        MealEntry {
            id: Uuid::new_v4(),
            food: food.into(),
            grams,
            calories,
            proteins,
            carbs,
            fats,
        }
    }

    #[test]
    fn grams_change_rescales_all_macros_proportionally() {
        let mut e = entry("pasta", 80.0, 282.4, 8.8, 56.8, 1.12);
        e.set_grams(120.0);
        let scale = 120.0 / 80.0;
        assert!((e.calories - 282.4 * scale).abs() < 1e-9);
        assert!((e.proteins - 8.8 * scale).abs() < 1e-9);
        assert!((e.carbs - 56.8 * scale).abs() < 1e-9);
        assert!((e.fats - 1.12 * scale).abs() < 1e-9);
        assert_eq!(e.grams, 120.0);
    }

    #[test]
    fn grams_change_without_baseline_keeps_absolute_values() {
        // no calorie baseline: nothing to derive a per-100g rate from
        let mut e = entry("pasta", 80.0, 0.0, 5.0, 10.0, 1.0);
        e.set_grams(160.0);
        assert_eq!(e.proteins, 5.0);
        assert_eq!(e.carbs, 10.0);
        assert_eq!(e.grams, 160.0);

        // no food name either
        let mut e = entry("", 80.0, 200.0, 5.0, 10.0, 1.0);
        e.set_grams(160.0);
        assert_eq!(e.calories, 200.0);
    }

    #[test]
    fn grams_from_zero_uses_unit_baseline() {
        // prior grams 0 but nonzero calories: rate is implied per 1 g
        let mut e = entry("misc", 0.0, 2.0, 0.0, 0.0, 0.0);
        e.set_grams(50.0);
        assert!((e.calories - 100.0).abs() < 1e-9);
    }

    #[test]
    fn fill_from_record_scales_per_100g_values() {
        let pasta = FoodRecord::new("Pasta".into(), 353.0, 71.0, 11.0, 1.4);
        let mut e = MealEntry::blank();
        e.grams = 80.0;
        e.food = "Pasta".into();
        e.fill_from_record(&pasta);
        assert!((e.calories - 282.4).abs() < 1e-9);
        assert!((e.proteins - 8.8).abs() < 1e-9);
    }

    #[test]
    fn apply_matches_catalog_by_name_case_insensitively() {
        let catalog = vec![FoodRecord::new("Pasta".into(), 353.0, 71.0, 11.0, 1.4)];
        let mut e = MealEntry::blank();
        e.apply(
            &EntryUpdate {
                grams: Some(100.0),
                food: Some("pasta".into()),
                ..Default::default()
            },
            &catalog,
        );
        assert_eq!(e.food, "pasta");
        assert!((e.calories - 353.0).abs() < 1e-9);
    }

    #[test]
    fn apply_explicit_fields_win_last() {
        let mut e = entry("pane", 50.0, 135.0, 4.5, 25.0, 1.0);
        e.apply(
            &EntryUpdate {
                calories: Some(99.0),
                ..Default::default()
            },
            &[],
        );
        assert_eq!(e.calories, 99.0);
        assert_eq!(e.grams, 50.0);
    }

    #[test]
    fn totals_sum_across_entries() {
        let entries = vec![
            entry("a", 100.0, 100.0, 10.0, 20.0, 2.0),
            entry("b", 50.0, 50.0, 5.0, 0.0, 3.0),
        ];
        let t = MacroTotals::of(&entries);
        assert_eq!(t.calories, 150.0);
        assert_eq!(t.proteins, 15.0);
        assert_eq!(t.carbs, 20.0);
        assert_eq!(t.fats, 5.0);
    }

    #[test]
    fn macro_percentages_use_unit_denominator_when_empty() {
        let t = MacroTotals::default();
        let (c, p, f) = t.macro_percentages();
        assert_eq!((c, p, f), (0.0, 0.0, 0.0));

        let t = MacroTotals {
            calories: 200.0,
            carbs: 25.0,
            proteins: 12.5,
            fats: 0.0,
        };
        let (c, p, _) = t.macro_percentages();
        assert!((c - 50.0).abs() < 1e-9);
        assert!((p - 25.0).abs() < 1e-9);
    }

    #[test]
    fn day_plan_tolerates_partial_documents() {
        let plan: DayPlan = serde_json::from_str(r#"{"lunch": []}"#).unwrap();
        assert!(plan.breakfast.is_empty());
        assert!(plan.dinner.is_empty());
    }

    #[test]
    fn day_keys_cover_negative_weeks() {
        assert_eq!(day_key(0, 0), "meals/week_0_day_0");
        assert_eq!(day_key(-2, 6), "meals/week_-2_day_6");
    }
}
