use anyhow::Context;
use csv::StringRecord;

use crate::foods::model::FoodRecord;

const NAME_ALIASES: [&str; 2] = ["name", "nome"];
const CALORIES_ALIASES: [&str; 2] = ["calories", "energia"];
const CARBS_ALIASES: [&str; 2] = ["carbs", "carboidrati"];
const PROTEINS_ALIASES: [&str; 2] = ["proteins", "proteine"];
const FATS_ALIASES: [&str; 2] = ["fats", "lipidi"];

fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().to_lowercase();
        aliases.iter().any(|a| h == *a)
    })
}

/// A cell that does not parse as a number (including a missing column)
/// coerces to 0. Accepts both dot and comma decimal separators.
fn numeric_cell(record: &StringRecord, column: Option<usize>) -> f64 {
    column
        .and_then(|i| record.get(i))
        .and_then(|s| s.trim().replace(',', ".").parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parse a tabular food database. Headers accept English or Italian aliases;
/// the category is always recomputed from the macros, never read from the
/// file; no duplicate detection is performed.
pub fn parse_food_csv(data: &str) -> anyhow::Result<Vec<FoodRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers = reader.headers().context("reading csv headers")?.clone();
    let name_col =
        find_column(&headers, &NAME_ALIASES).context("missing name/nome column")?;
    let calories_col = find_column(&headers, &CALORIES_ALIASES);
    let carbs_col = find_column(&headers, &CARBS_ALIASES);
    let proteins_col = find_column(&headers, &PROTEINS_ALIASES);
    let fats_col = find_column(&headers, &FATS_ALIASES);

    let mut foods = Vec::new();
    for record in reader.records() {
        let record = record.context("reading csv row")?;
        let name = record.get(name_col).unwrap_or("").trim().to_string();
        foods.push(FoodRecord::new(
            name,
            numeric_cell(&record, calories_col),
            numeric_cell(&record, carbs_col),
            numeric_cell(&record, proteins_col),
            numeric_cell(&record, fats_col),
        ));
    }
    Ok(foods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::model::Category;

    #[test]
    fn parses_english_headers() {
        let csv = "name,calories,carbs,proteins,fats\n\
                   Pasta,353,71.0,11.0,1.4\n\
                   Tonno,103,0,25.0,0.6\n";
        let foods = parse_food_csv(csv).unwrap();
        assert_eq!(foods.len(), 2);
        assert_eq!(foods[0].name, "Pasta");
        assert_eq!(foods[0].category, Category::Carbohydrate);
        assert_eq!(foods[1].category, Category::Protein);
    }

    #[test]
    fn parses_italian_aliases_and_comma_decimals() {
        let csv = "Nome,Energia,Carboidrati,Proteine,Lipidi\n\
                   Olio di oliva,\"899\",0,0,\"99,9\"\n";
        let foods = parse_food_csv(csv).unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(foods[0].name, "Olio di oliva");
        assert!((foods[0].fats - 99.9).abs() < 1e-9);
        assert_eq!(foods[0].category, Category::Lipid);
    }

    #[test]
    fn junk_numerics_coerce_to_zero() {
        let csv = "name,calories,carbs,proteins,fats\n\
                   Mistero,n/a,,abc,\n";
        let foods = parse_food_csv(csv).unwrap();
        assert_eq!(foods[0].calories, 0.0);
        assert_eq!(foods[0].carbs, 0.0);
        assert_eq!(foods[0].proteins, 0.0);
        assert_eq!(foods[0].fats, 0.0);
        // all-zero macros still classify (carbs win the all-way tie)
        assert_eq!(foods[0].category, Category::Carbohydrate);
    }

    #[test]
    fn category_column_in_file_is_ignored() {
        let csv = "name,category,calories,carbs,proteins,fats\n\
                   Pollo,LPD,110,0,23.0,1.5\n";
        let foods = parse_food_csv(csv).unwrap();
        assert_eq!(foods[0].category, Category::Protein);
    }

    #[test]
    fn missing_name_column_is_an_error() {
        let csv = "calories,carbs\n100,10\n";
        assert!(parse_food_csv(csv).is_err());
    }
}
