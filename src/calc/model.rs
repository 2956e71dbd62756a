use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

/// Anthropometric inputs. `compute` itself never validates; callers refuse to
/// compute when age/height/weight are non-positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalProfile {
    pub age: f64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: Gender,
    pub laf: f64,
    pub protein_ratio: f64,
    pub daily_deficit: i64,
}

impl Default for PersonalProfile {
    fn default() -> Self {
        Self {
            age: 0.0,
            height_cm: 0.0,
            weight_kg: 0.0,
            gender: Gender::Female,
            laf: 1.4,
            protein_ratio: 0.8,
            daily_deficit: 275,
        }
    }
}

impl PersonalProfile {
    pub fn has_required_inputs(&self) -> bool {
        self.age > 0.0 && self.height_cm > 0.0 && self.weight_kg > 0.0
    }

    /// Clamp LAF into [1.45, 2.10] at 0.05 steps, protein ratio into
    /// [0.8, 3.0]; everything else is taken as entered.
    pub fn normalized(mut self) -> Self {
        self.laf = (self.laf.clamp(1.45, 2.10) * 20.0).round() / 20.0;
        self.protein_ratio = self.protein_ratio.clamp(0.8, 3.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    ObesityClassI,
    ObesityClassII,
    ObesityClassIII,
}

impl BmiCategory {
    /// Thresholds are upper-exclusive at 18.5 / 25 / 30 / 35 / 40.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else if bmi < 35.0 {
            Self::ObesityClassI
        } else if bmi < 40.0 {
            Self::ObesityClassII
        } else {
            Self::ObesityClassIII
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub ideal_weight: f64,
    pub basal_metabolism: f64,
    pub daily_metabolism: f64,
    pub weekly_metabolism: f64,
    pub daily_deficit: i64,
    pub weekly_deficit: i64,
    pub weekly_calories: f64,
    pub daily_protein_rda: f64,
    pub weekly_protein_rda: f64,
}

/// Derive every metric from the profile. Ideal weight depends on height
/// alone; the Harris-Benedict basal term uses the ideal weight, not the
/// measured one.
pub fn compute(profile: &PersonalProfile) -> CalculationResult {
    let height_m = profile.height_cm / 100.0;
    let bmi = profile.weight_kg / (height_m * height_m);
    let ideal_weight = 21.5 * height_m * height_m;

    let basal_metabolism = match profile.gender {
        Gender::Female => {
            655.0 + 9.5 * ideal_weight + 1.8 * profile.height_cm - 4.6 * profile.age
        }
        Gender::Male => {
            66.5 + 13.75 * ideal_weight + 5.0 * profile.height_cm - 6.75 * profile.age
        }
    };

    let daily_metabolism = basal_metabolism * profile.laf;
    let weekly_metabolism = daily_metabolism * 7.0;

    let daily_deficit = profile.daily_deficit;
    let weekly_deficit = daily_deficit * 7;
    let weekly_calories = weekly_metabolism - weekly_deficit as f64;

    let daily_protein_rda = ideal_weight * profile.protein_ratio;
    let weekly_protein_rda = daily_protein_rda * 7.0;

    CalculationResult {
        bmi,
        bmi_category: BmiCategory::from_bmi(bmi),
        ideal_weight,
        basal_metabolism,
        daily_metabolism,
        weekly_metabolism,
        daily_deficit,
        weekly_deficit,
        weekly_calories,
        daily_protein_rda,
        weekly_protein_rda,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Monday-first index, matching the planner's day indexes.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Monday),
            1 => Some(Self::Tuesday),
            2 => Some(Self::Wednesday),
            3 => Some(Self::Thursday),
            4 => Some(Self::Friday),
            5 => Some(Self::Saturday),
            6 => Some(Self::Sunday),
            _ => None,
        }
    }
}

/// Sparse: days without an entry have no ceiling.
pub type DailyLimits = BTreeMap<Weekday, i64>;

/// Profile and results are stored and reloaded as one unit so the results
/// can never drift from the profile they were derived from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculationsDoc {
    pub profile: Option<PersonalProfile>,
    pub results: Option<CalculationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> PersonalProfile {
        PersonalProfile {
            age: 30.0,
            height_cm: 170.0,
            weight_kg: 70.0,
            gender: Gender::Female,
            laf: 1.4,
            protein_ratio: 0.8,
            daily_deficit: 275,
        }
    }

    #[test]
    fn worked_example_female() {
        let r = compute(&sample_profile());
        assert!((r.ideal_weight - 62.135).abs() < 1e-9);
        assert!((r.basal_metabolism - 1413.2825).abs() < 1e-9);
        assert!((r.daily_metabolism - r.basal_metabolism * 1.4).abs() < 1e-9);
        assert!((r.weekly_metabolism - r.daily_metabolism * 7.0).abs() < 1e-9);
        assert_eq!(r.weekly_deficit, 1925);
        assert!((r.weekly_calories - (r.weekly_metabolism - 1925.0)).abs() < 1e-9);
        assert!((r.daily_protein_rda - 62.135 * 0.8).abs() < 1e-9);
        assert!((r.weekly_protein_rda - r.daily_protein_rda * 7.0).abs() < 1e-9);
    }

    #[test]
    fn male_basal_uses_male_coefficients() {
        let profile = PersonalProfile {
            gender: Gender::Male,
            ..sample_profile()
        };
        let r = compute(&profile);
        let expected = 66.5 + 13.75 * r.ideal_weight + 5.0 * 170.0 - 6.75 * 30.0;
        assert!((r.basal_metabolism - expected).abs() < 1e-9);
    }

    #[test]
    fn metabolism_identities_hold_for_various_inputs() {
        for (age, height, weight, laf) in [
            (18.0, 150.0, 45.0, 1.45),
            (45.0, 182.0, 95.0, 1.75),
            (70.0, 168.0, 62.0, 2.10),
        ] {
            let profile = PersonalProfile {
                age,
                height_cm: height,
                weight_kg: weight,
                laf,
                ..sample_profile()
            };
            let r = compute(&profile);
            assert_eq!(r.daily_metabolism, r.basal_metabolism * laf);
            assert_eq!(r.weekly_metabolism, r.daily_metabolism * 7.0);
        }
    }

    #[test]
    fn bmi_boundaries_are_upper_exclusive() {
        assert_eq!(BmiCategory::from_bmi(18.4999), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.999), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::ObesityClassI);
        assert_eq!(BmiCategory::from_bmi(35.0), BmiCategory::ObesityClassII);
        assert_eq!(BmiCategory::from_bmi(40.0), BmiCategory::ObesityClassIII);
        assert_eq!(BmiCategory::from_bmi(55.0), BmiCategory::ObesityClassIII);
    }

    #[test]
    fn normalization_clamps_and_steps() {
        let p = PersonalProfile {
            laf: 1.4,
            protein_ratio: 0.5,
            ..sample_profile()
        }
        .normalized();
        assert_eq!(p.laf, 1.45);
        assert_eq!(p.protein_ratio, 0.8);

        let p = PersonalProfile {
            laf: 3.0,
            protein_ratio: 5.0,
            ..sample_profile()
        }
        .normalized();
        assert_eq!(p.laf, 2.10);
        assert_eq!(p.protein_ratio, 3.0);

        // 1.87 is not a valid step; rounds to 1.85
        let p = PersonalProfile {
            laf: 1.87,
            ..sample_profile()
        }
        .normalized();
        assert!((p.laf - 1.85).abs() < 1e-9);
    }

    #[test]
    fn weekday_indexing_is_monday_first() {
        assert_eq!(Weekday::from_index(0), Some(Weekday::Monday));
        assert_eq!(Weekday::from_index(6), Some(Weekday::Sunday));
        assert_eq!(Weekday::from_index(7), None);
    }

    #[test]
    fn weekday_serializes_as_lowercase_map_key() {
        let mut limits = DailyLimits::new();
        limits.insert(Weekday::Monday, 1800);
        let json = serde_json::to_string(&limits).unwrap();
        assert_eq!(json, r#"{"monday":1800}"#);
        let back: DailyLimits = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&Weekday::Monday), Some(&1800));
    }
}
