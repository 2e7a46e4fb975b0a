//! Recipe library: the read-only catalog every session is bound to.
//!
//! Ingredient and step order is significant; it defines the 1-based numbering
//! shown to the user and must stay stable for the lifetime of a session.

mod builtin;
mod import;

pub use import::slugify;

use crate::error::{Result, SousChefError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single recipe. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Recipe {
    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Opening line for a new or reset session.
    pub fn greeting(&self) -> String {
        format!(
            "Let's cook {}! Ask for 'ingredients', 'steps', or say 'next' to begin.",
            self.name
        )
    }
}

/// Catalog entry used for pick-mode search and listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
}

/// Mapping `key -> Recipe` plus a name-sorted catalog.
#[derive(Debug, Clone)]
pub struct RecipeLibrary {
    recipes: HashMap<String, Recipe>,
    catalog: Vec<CatalogEntry>,
}

impl RecipeLibrary {
    /// Builds a library from recipes. Empty keys are filled with a slug of the name;
    /// later duplicates of a key are dropped.
    pub fn from_recipes<I: IntoIterator<Item = Recipe>>(recipes: I) -> Self {
        let mut map = HashMap::new();
        for mut recipe in recipes {
            if recipe.key.is_empty() {
                recipe.key = slugify(&recipe.name);
            }
            map.entry(recipe.key.clone()).or_insert(recipe);
        }
        Self::from_map(map)
    }

    fn from_map(recipes: HashMap<String, Recipe>) -> Self {
        let mut catalog: Vec<CatalogEntry> = recipes
            .values()
            .map(|r| CatalogEntry {
                key: r.key.clone(),
                name: r.name.clone(),
            })
            .collect();
        catalog.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.key.cmp(&b.key))
        });
        Self { recipes, catalog }
    }

    /// The small set of recipes compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_recipes(builtin::recipes())
    }

    /// Loads the JSON library at `path`, falling back to [`RecipeLibrary::builtin`] when the
    /// file is missing, malformed, or empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(
                target: "souschef::recipes",
                path = %path.display(),
                "Recipe file not found; using built-in recipes"
            );
            return Self::builtin();
        }
        match Self::read_json(path) {
            Ok(lib) if !lib.is_empty() => {
                tracing::info!(
                    target: "souschef::recipes",
                    path = %path.display(),
                    count = lib.len(),
                    "Loaded recipe library"
                );
                lib
            }
            Ok(_) => {
                tracing::warn!(target: "souschef::recipes", path = %path.display(), "Recipe file is empty; using built-in recipes");
                Self::builtin()
            }
            Err(e) => {
                tracing::warn!(target: "souschef::recipes", path = %path.display(), error = %e, "Recipe file unreadable; using built-in recipes");
                Self::builtin()
            }
        }
    }

    /// Strict JSON read: `{ "<key>": { name, description, ingredients, steps } }`.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let raw: HashMap<String, Recipe> = serde_json::from_slice(&bytes)?;
        let recipes = raw.into_iter().map(|(key, mut recipe)| {
            if recipe.key.is_empty() {
                recipe.key = key;
            }
            recipe
        });
        Ok(Self::from_recipes(recipes))
    }

    /// Writes the library as a pretty JSON object keyed by recipe key.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let ordered: std::collections::BTreeMap<&str, &Recipe> =
            self.recipes.iter().map(|(k, v)| (k.as_str(), v)).collect();
        let json = serde_json::to_vec_pretty(&ordered)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Recipe> {
        self.recipes.get(key)
    }

    /// Like [`get`](Self::get) but with a not-found error.
    pub fn require(&self, key: &str) -> Result<&Recipe> {
        self.get(key)
            .ok_or_else(|| SousChefError::RecipeNotFound(key.to_string()))
    }

    /// Recipes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Entries sorted by lower-cased display name.
    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_has_garlic_pasta_with_seven_steps() {
        let lib = RecipeLibrary::builtin();
        let pasta = lib.require("garlic_pasta").unwrap();
        assert_eq!(pasta.step_count(), 7);
        assert_eq!(pasta.name, "Simple Garlic Pasta");
        assert!(lib.get("scrambled_eggs").is_some());
    }

    #[test]
    fn catalog_is_sorted_case_insensitively() {
        let lib = RecipeLibrary::from_recipes(vec![
            Recipe {
                key: "b".into(),
                name: "banana bread".into(),
                description: String::new(),
                ingredients: vec![],
                steps: vec![],
            },
            Recipe {
                key: "a".into(),
                name: "Apple Pie".into(),
                description: String::new(),
                ingredients: vec![],
                steps: vec![],
            },
        ]);
        let names: Vec<&str> = lib.catalog().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Apple Pie", "banana bread"]);
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let lib = RecipeLibrary::load("/definitely/not/here/recipes.json");
        assert_eq!(lib.len(), RecipeLibrary::builtin().len());
    }

    #[test]
    fn malformed_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();
        let lib = RecipeLibrary::load(&path);
        assert!(lib.get("garlic_pasta").is_some());
    }

    #[test]
    fn json_round_trip_fills_missing_keys_from_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.json");
        std::fs::write(
            &path,
            br#"{"toast": {"name": "Toast", "ingredients": ["bread"], "steps": ["toast it"]}}"#,
        )
        .unwrap();
        let lib = RecipeLibrary::load(&path);
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.require("toast").unwrap().key, "toast");

        let out = dir.path().join("nested").join("out.json");
        lib.write_json(&out).unwrap();
        let again = RecipeLibrary::read_json(&out).unwrap();
        assert_eq!(again.require("toast").unwrap().steps, vec!["toast it"]);
    }

    #[test]
    fn greeting_names_the_recipe() {
        let lib = RecipeLibrary::builtin();
        let greeting = lib.require("scrambled_eggs").unwrap().greeting();
        assert!(greeting.starts_with("Let's cook Soft Scrambled Eggs!"));
    }

    #[test]
    fn unknown_key_is_not_found() {
        let lib = RecipeLibrary::builtin();
        let err = lib.require("nope").unwrap_err();
        assert!(matches!(err, SousChefError::RecipeNotFound(k) if k == "nope"));
    }
}
