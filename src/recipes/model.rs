use serde::{Deserialize, Serialize};

use crate::diet::model::MealEntry;

/// A named collection of portioned ingredients with cached rollups. The
/// aggregates are recomputed and persisted together on every ingredient
/// mutation, so a stored recipe is always internally consistent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<MealEntry>,
    pub total_grams: f64,
    pub total_calories: f64,
    pub total_proteins: f64,
    pub calories_per_100g: f64,
    pub proteins_per_100g: f64,
}

impl Recipe {
    pub fn new(name: String, ingredients: Vec<MealEntry>) -> Self {
        let mut recipe = Self {
            name,
            ingredients,
            ..Self::default()
        };
        recipe.recompute();
        recipe
    }

    /// Per-100g values are 0 when total grams is 0.
    pub fn recompute(&mut self) {
        // fold from +0.0: an empty `f64` sum yields -0.0, which would end
        // up in stored documents and exports.
        self.total_grams = self.ingredients.iter().fold(0.0, |acc, i| acc + i.grams);
        self.total_calories = self.ingredients.iter().fold(0.0, |acc, i| acc + i.calories);
        self.total_proteins = self.ingredients.iter().fold(0.0, |acc, i| acc + i.proteins);
        if self.total_grams > 0.0 {
            self.calories_per_100g = self.total_calories / self.total_grams * 100.0;
            self.proteins_per_100g = self.total_proteins / self.total_grams * 100.0;
        } else {
            self.calories_per_100g = 0.0;
            self.proteins_per_100g = 0.0;
        }
    }
}

pub fn recipe_key(name: &str) -> String {
    format!("recipes/{name}")
}

#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub name: String,
    pub ingredients: usize,
    pub total_grams: f64,
    pub total_calories: f64,
    pub total_proteins: f64,
    pub calories_per_100g: f64,
    pub proteins_per_100g: f64,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            ingredients: recipe.ingredients.len(),
            total_grams: recipe.total_grams,
            total_calories: recipe.total_calories,
            total_proteins: recipe.total_proteins,
            calories_per_100g: recipe.calories_per_100g,
            proteins_per_100g: recipe.proteins_per_100g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ingredient(grams: f64, calories: f64, proteins: f64) -> MealEntry {
        MealEntry {
            id: Uuid::new_v4(),
            food: "x".into(),
            grams,
            calories,
            proteins,
            carbs: 0.0,
            fats: 0.0,
        }
    }

    #[test]
    fn totals_are_simple_sums() {
        let recipe = Recipe::new(
            "Ragù".into(),
            vec![ingredient(300.0, 450.0, 60.0), ingredient(200.0, 150.0, 5.0)],
        );
        assert_eq!(recipe.total_grams, 500.0);
        assert_eq!(recipe.total_calories, 600.0);
        assert_eq!(recipe.total_proteins, 65.0);
    }

    #[test]
    fn per_100g_normalizes_by_total_grams() {
        let recipe = Recipe::new("Pesto".into(), vec![ingredient(250.0, 500.0, 20.0)]);
        assert!((recipe.calories_per_100g - 200.0).abs() < 1e-9);
        assert!((recipe.proteins_per_100g - 8.0).abs() < 1e-9);
    }

    #[test]
    fn per_100g_is_zero_at_zero_grams() {
        let recipe = Recipe::new("Vuota".into(), vec![ingredient(0.0, 0.0, 0.0)]);
        assert_eq!(recipe.calories_per_100g, 0.0);
        assert_eq!(recipe.proteins_per_100g, 0.0);

        let empty = Recipe::new("Niente".into(), vec![]);
        assert_eq!(empty.calories_per_100g, 0.0);
    }

    #[test]
    fn empty_recipe_totals_are_positive_zero() {
        let empty = Recipe::new("Vuota".into(), vec![]);
        assert!(empty.total_grams.is_sign_positive());
        assert!(empty.total_calories.is_sign_positive());
        assert!(empty.total_proteins.is_sign_positive());
        assert_eq!(
            serde_json::to_value(&empty).unwrap()["total_grams"].to_string(),
            "0.0"
        );
    }

    #[test]
    fn recompute_tracks_ingredient_edits() {
        let mut recipe = Recipe::new("Base".into(), vec![ingredient(100.0, 100.0, 10.0)]);
        recipe.ingredients.push(ingredient(100.0, 300.0, 0.0));
        recipe.recompute();
        assert_eq!(recipe.total_calories, 400.0);
        assert!((recipe.calories_per_100g - 200.0).abs() < 1e-9);
    }

    #[test]
    fn keys_are_name_scoped() {
        assert_eq!(recipe_key("Ragù"), "recipes/Ragù");
    }
}
