//! Form field parsing and validation.
//!
//! List-valued fields arrive as comma-separated strings (steps as one entry
//! per line). Validation failures carry the human-readable message the
//! originating form is re-rendered with.

/// Placeholder stored when a recipe lists no supplies
pub const SUPPLIES_PLACEHOLDER: &str = "None";

/// Shown when ingredients, steps or a numeric serving size are missing
pub const RECIPE_INCOMPLETE_ERROR: &str = "Could not add recipe :(!";

/// Shown when the recipe could not be stored
pub const RECIPE_SAVE_ERROR: &str = "Could not add recipe!";

pub const COOKBOOK_SAVE_ERROR: &str = "Could not add cookbook!";

pub const IMAGE_SAVE_ERROR: &str = "Could not add image!";

/// Split a comma-separated field, trimming entries and dropping empty ones.
/// A missing field yields an empty list.
pub fn split_list(input: Option<&str>) -> Vec<String> {
    input
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Split a multi-line field (`\r\n` or `\n`), one entry per non-blank line
pub fn split_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Supplies default to a single placeholder entry when none are given
pub fn parse_supplies(input: Option<&str>) -> Vec<String> {
    let supplies = split_list(input);
    if supplies.is_empty() {
        vec![SUPPLIES_PLACEHOLDER.to_string()]
    } else {
        supplies
    }
}

/// Parse the serving size as an integer. Range is checked separately.
pub fn parse_serving_size(input: Option<&str>) -> Option<i64> {
    input.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Non-empty, trimmed value of a required text field
pub fn required_text(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Raw recipe form fields
#[derive(Debug, Default, Clone)]
pub struct RecipeInput {
    pub name: Option<String>,
    pub tags: Option<String>,
    pub prep_time: Option<String>,
    pub serving_size: Option<String>,
    pub ingredients: Option<String>,
    pub supplies: Option<String>,
    pub steps: Option<String>,
}

/// Recipe fields that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipe {
    pub name: String,
    pub tags: Vec<String>,
    pub prep_time: String,
    pub serving_size: i64,
    pub ingredients: Vec<String>,
    pub supplies: Vec<String>,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRejection {
    /// Ingredients, steps or a numeric serving size are missing
    Incomplete,
    /// Present but unacceptable: empty name or prep time, serving size below one
    Invalid,
}

impl RecipeRejection {
    pub fn message(&self) -> &'static str {
        match self {
            RecipeRejection::Incomplete => RECIPE_INCOMPLETE_ERROR,
            RecipeRejection::Invalid => RECIPE_SAVE_ERROR,
        }
    }
}

impl RecipeInput {
    pub fn validate(&self) -> Result<ValidRecipe, RecipeRejection> {
        let ingredients = split_list(self.ingredients.as_deref());
        let steps = self.steps.as_deref().map(split_lines).unwrap_or_default();
        let serving_size = parse_serving_size(self.serving_size.as_deref());

        let serving_size = match serving_size {
            Some(size) if !ingredients.is_empty() && !steps.is_empty() => size,
            _ => return Err(RecipeRejection::Incomplete),
        };

        if serving_size < 1 {
            return Err(RecipeRejection::Invalid);
        }
        let name = required_text(self.name.as_deref()).ok_or(RecipeRejection::Invalid)?;
        let prep_time =
            required_text(self.prep_time.as_deref()).ok_or(RecipeRejection::Invalid)?;

        Ok(ValidRecipe {
            name,
            tags: split_list(self.tags.as_deref()),
            prep_time,
            serving_size,
            ingredients,
            supplies: parse_supplies(self.supplies.as_deref()),
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tea() -> RecipeInput {
        RecipeInput {
            name: Some("Tea".to_string()),
            tags: None,
            prep_time: Some("5 min".to_string()),
            serving_size: Some("2".to_string()),
            ingredients: Some("water,leaves".to_string()),
            supplies: None,
            steps: Some("boil\r\nsteep".to_string()),
        }
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("dessert, quick ,  easy")), vec!["dessert", "quick", "easy"]);
        assert_eq!(split_list(Some("a,,b, ")), vec!["a", "b"]);
        assert!(split_list(Some("")).is_empty());
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("boil\r\nsteep"), vec!["boil", "steep"]);
        assert_eq!(split_lines("boil\nsteep\n\n  serve  "), vec!["boil", "steep", "serve"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_parse_supplies_defaults_to_placeholder() {
        assert_eq!(parse_supplies(None), vec!["None"]);
        assert_eq!(parse_supplies(Some("  ")), vec!["None"]);
        assert_eq!(parse_supplies(Some("pot,kettle")), vec!["pot", "kettle"]);
    }

    #[test]
    fn test_parse_serving_size() {
        assert_eq!(parse_serving_size(Some("2")), Some(2));
        assert_eq!(parse_serving_size(Some(" 4 ")), Some(4));
        assert_eq!(parse_serving_size(Some("abc")), None);
        assert_eq!(parse_serving_size(Some("")), None);
        assert_eq!(parse_serving_size(None), None);
    }

    #[test]
    fn test_validate_complete_recipe() {
        let recipe = tea().validate().unwrap();
        assert_eq!(recipe.name, "Tea");
        assert_eq!(recipe.serving_size, 2);
        assert_eq!(recipe.ingredients, vec!["water", "leaves"]);
        assert_eq!(recipe.steps, vec!["boil", "steep"]);
        assert_eq!(recipe.supplies, vec!["None"]);
        assert!(recipe.tags.is_empty());
    }

    #[test]
    fn test_validate_rejects_non_numeric_serving_size() {
        let mut input = tea();
        input.serving_size = Some("abc".to_string());
        assert_eq!(input.validate(), Err(RecipeRejection::Incomplete));
        assert_eq!(RecipeRejection::Incomplete.message(), "Could not add recipe :(!");
    }

    #[test]
    fn test_validate_rejects_missing_ingredients_or_steps() {
        let mut input = tea();
        input.ingredients = None;
        assert_eq!(input.validate(), Err(RecipeRejection::Incomplete));

        let mut input = tea();
        input.steps = Some("\r\n".to_string());
        assert_eq!(input.validate(), Err(RecipeRejection::Incomplete));
    }

    #[test]
    fn test_validate_rejects_invalid_values() {
        let mut input = tea();
        input.serving_size = Some("0".to_string());
        assert_eq!(input.validate(), Err(RecipeRejection::Invalid));

        let mut input = tea();
        input.name = Some("   ".to_string());
        assert_eq!(input.validate(), Err(RecipeRejection::Invalid));

        let mut input = tea();
        input.prep_time = None;
        assert_eq!(input.validate(), Err(RecipeRejection::Invalid));
        assert_eq!(RecipeRejection::Invalid.message(), "Could not add recipe!");
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text(Some("  Pies ")), Some("Pies".to_string()));
        assert_eq!(required_text(Some("   ")), None);
        assert_eq!(required_text(None), None);
    }
}
