use anyhow::Context;

use crate::recipes::model::Recipe;

/// Render a recipe as CSV: one row per ingredient, a blank separator, then
/// TOTALI and PER 100g trailer rows carrying the cached rollups.
pub fn to_csv(recipe: &Recipe) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "Alimento",
        "Grammi",
        "Calorie",
        "Proteine (g)",
        "Carboidrati (g)",
        "Grassi (g)",
    ])?;

    for item in &recipe.ingredients {
        writer.write_record([
            item.food.clone(),
            format!("{}", item.grams),
            format!("{}", item.calories.round() as i64),
            format!("{:.1}", item.proteins),
            format!("{:.1}", item.carbs),
            format!("{:.1}", item.fats),
        ])?;
    }

    writer.write_record(["", "", "", "", "", ""])?;
    writer.write_record([
        "TOTALI".to_string(),
        format!("{}", recipe.total_grams),
        format!("{}", recipe.total_calories.round() as i64),
        format!("{:.1}", recipe.total_proteins),
        String::new(),
        String::new(),
    ])?;
    writer.write_record([
        "PER 100g".to_string(),
        "100".to_string(),
        format!("{}", recipe.calories_per_100g.round() as i64),
        format!("{:.1}", recipe.proteins_per_100g),
        String::new(),
        String::new(),
    ])?;

    let bytes = writer
        .into_inner()
        .context("flushing recipe csv")?;
    Ok(bytes)
}

/// Safe download name derived from the recipe name.
pub fn export_filename(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("{stem}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::model::MealEntry;
    use uuid::Uuid;

    fn recipe() -> Recipe {
        Recipe::new(
            "Pasta al Tonno".into(),
            vec![
                MealEntry {
                    id: Uuid::new_v4(),
                    food: "Pasta".into(),
                    grams: 160.0,
                    calories: 564.8,
                    proteins: 17.6,
                    carbs: 113.6,
                    fats: 2.24,
                },
                MealEntry {
                    id: Uuid::new_v4(),
                    food: "Tonno".into(),
                    grams: 80.0,
                    calories: 82.4,
                    proteins: 20.0,
                    carbs: 0.0,
                    fats: 0.48,
                },
            ],
        )
    }

    #[test]
    fn export_has_header_rows_and_trailers() {
        let csv = String::from_utf8(to_csv(&recipe()).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        // header + 2 ingredients + blank + TOTALI + PER 100g
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Alimento,Grammi,Calorie"));
        assert!(lines[1].starts_with("Pasta,160,565,17.6"));
        assert!(lines[4].starts_with("TOTALI,240,647,37.6"));
        assert!(lines[5].starts_with("PER 100g,100,270,15.7"));
    }

    #[test]
    fn empty_recipe_still_exports_trailers() {
        let csv = String::from_utf8(to_csv(&Recipe::new("Vuota".into(), vec![])).unwrap()).unwrap();
        assert!(csv.contains("TOTALI,0,0,0.0"));
        assert!(csv.contains("PER 100g,100,0,0.0"));
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(export_filename("Pasta al Tonno"), "pasta_al_tonno.csv");
        assert_eq!(export_filename("Ragù #2"), "rag___2.csv");
    }
}
