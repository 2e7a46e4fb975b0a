//! CSV import: normalizes a recipe dump (`Title`, `Ingredients`, `Instructions`)
//! into the JSON library format consumed by [`RecipeLibrary::load`].

use super::{Recipe, RecipeLibrary};
use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const MAX_SLUG_LEN: usize = 80;
const MIN_INGREDIENTS: usize = 2;
const MIN_STEPS: usize = 2;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Ingredients", default)]
    ingredients: Option<String>,
    #[serde(rename = "Instructions", default)]
    instructions: Option<String>,
}

/// Key generator from a recipe title: lowercase alphanumerics, `_` elsewhere, no runs.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').chars().take(MAX_SLUG_LEN).collect()
}

/// Accepts either plain comma-joined text or a list literal like `['1 cup flour', '2 eggs']`.
fn parse_ingredients(raw: &str) -> Vec<String> {
    let mut text = raw.trim();
    if text.starts_with('[') && text.ends_with(']') && text.len() >= 2 {
        text = &text[1..text.len() - 1];
    }
    text.split("',")
        .map(|part| {
            part.trim()
                .trim_matches(|c: char| matches!(c, '[' | ']' | '\'' | '"' | ' '))
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// One step per line, or per sentence when the instructions are a single line.
fn parse_steps(raw: &str) -> Vec<String> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let sep = if normalized.contains('\n') { '\n' } else { '.' };
    normalized
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn recipe_from_row(row: CsvRow) -> Option<Recipe> {
    let title = row.title.as_deref().map(str::trim).unwrap_or("");
    let ingredients_text = row.ingredients.as_deref().map(str::trim).unwrap_or("");
    let instructions_text = row.instructions.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() || ingredients_text.is_empty() || instructions_text.is_empty() {
        return None;
    }
    let key = slugify(title);
    if key.is_empty() {
        return None;
    }
    let ingredients = parse_ingredients(ingredients_text);
    let steps = parse_steps(instructions_text);
    if ingredients.len() < MIN_INGREDIENTS || steps.len() < MIN_STEPS {
        return None;
    }
    Some(Recipe {
        key,
        name: title.to_string(),
        description: String::new(),
        ingredients,
        steps,
    })
}

impl RecipeLibrary {
    /// Reads a recipe CSV. Malformed or too-short rows are skipped; on duplicate slugs the
    /// first row wins.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        Self::from_csv_reader(&mut reader)
    }

    fn from_csv_reader<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let mut recipes: HashMap<String, Recipe> = HashMap::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<CsvRow>() {
            match recipe_from_row(row?) {
                Some(recipe) => {
                    recipes.entry(recipe.key.clone()).or_insert(recipe);
                }
                None => skipped += 1,
            }
        }
        tracing::info!(
            target: "souschef::recipes",
            loaded = recipes.len(),
            skipped,
            "Imported recipes from CSV"
        );
        Ok(Self::from_map(recipes))
    }
}
