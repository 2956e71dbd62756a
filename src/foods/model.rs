use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro-dominant class, by kcal contribution of each macro. Wire codes keep
/// the historical three-letter forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "CRB")]
    Carbohydrate,
    #[serde(rename = "PRT")]
    Protein,
    #[serde(rename = "LPD")]
    Lipid,
}

/// Compare carbs*4 vs proteins*4 vs fats*9. Carbs win every tie, proteins
/// win the protein/fat tie.
pub fn classify(carbs: f64, proteins: f64, fats: f64) -> Category {
    let carb_kcal = carbs * 4.0;
    let protein_kcal = proteins * 4.0;
    let fat_kcal = fats * 9.0;

    if carb_kcal >= protein_kcal && carb_kcal >= fat_kcal {
        Category::Carbohydrate
    } else if protein_kcal >= fat_kcal {
        Category::Protein
    } else {
        Category::Lipid
    }
}

/// One catalog row; all nutrient fields are per 100 g. `category` is strictly
/// derived from the macros and recomputed on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: Uuid,
    pub name: String,
    pub category: Category,
    pub calories: f64,
    pub carbs: f64,
    pub proteins: f64,
    pub fats: f64,
}

impl FoodRecord {
    pub fn new(name: String, calories: f64, carbs: f64, proteins: f64, fats: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            category: classify(carbs, proteins, fats),
            calories,
            carbs,
            proteins,
            fats,
        }
    }

    pub fn reclassify(&mut self) {
        self.category = classify(self.carbs, self.proteins, self.fats);
    }
}
