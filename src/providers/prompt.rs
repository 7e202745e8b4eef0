use std::fmt;
use std::str::FromStr;

/// The Chef Quirky system prompt.
///
/// Asks for a short quirky intro followed by `**Name**` headers (or
/// `**Day: Name**` for weekly sets) with `Ingredients:` bullets and numbered
/// `Instructions:`, which is the shape the response parser expects.
///
/// The prompt is loaded from `prompt.txt` at compile time using the
/// `include_str!` macro, making it easy to edit without dealing with
/// Rust string syntax.
pub const CHEF_QUIRKY_PROMPT: &str = include_str!("prompt.txt");

/// Full prompt for a single dish request
pub fn build_recipe_prompt(request: &str) -> String {
    format!(
        "{}\n\nGenerate a recipe for: {}",
        CHEF_QUIRKY_PROMPT.trim_end(),
        request.trim()
    )
}

/// Full prompt for a themed seven-day set
pub fn build_weekly_prompt(category: WeeklyCategory) -> String {
    format!("{}\n\n{}", CHEF_QUIRKY_PROMPT.trim_end(), category.request())
}

/// The themed weekly sets on offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeeklyCategory {
    Dinners,
    Cocktails,
    FastFood,
    SavouryMeals,
    Cakes,
}

impl WeeklyCategory {
    pub const ALL: [WeeklyCategory; 5] = [
        WeeklyCategory::Dinners,
        WeeklyCategory::Cocktails,
        WeeklyCategory::FastFood,
        WeeklyCategory::SavouryMeals,
        WeeklyCategory::Cakes,
    ];

    /// Path segment of the HTTP endpoint serving this set
    pub fn slug(&self) -> &'static str {
        match self {
            WeeklyCategory::Dinners => "weekly_recipes",
            WeeklyCategory::Cocktails => "cocktails",
            WeeklyCategory::FastFood => "fast_food",
            WeeklyCategory::SavouryMeals => "savoury_meals",
            WeeklyCategory::Cakes => "cakes",
        }
    }

    /// Singular noun used in placeholder names
    pub fn label(&self) -> &'static str {
        match self {
            WeeklyCategory::Dinners => "Dinner",
            WeeklyCategory::Cocktails => "Cocktail",
            WeeklyCategory::FastFood => "Fast Food",
            WeeklyCategory::SavouryMeals => "Savoury Meal",
            WeeklyCategory::Cakes => "Cake",
        }
    }

    fn request(&self) -> &'static str {
        match self {
            WeeklyCategory::Dinners => {
                "Provide seven dinner recipes for the week, one for each day (Monday to Sunday). Format each recipe with a header like '**Monday: Recipe Name**', followed by Ingredients and Instructions. Ensure each is diverse and includes both ingredients and instructions."
            }
            WeeklyCategory::Cocktails => {
                "Provide seven unique cocktail recipes, one for each day from Monday to Sunday. Format each recipe with a header like '**Monday: Cocktail Name**', followed by Ingredients and Instructions. Ensure each cocktail includes both ingredients and instructions."
            }
            WeeklyCategory::FastFood => {
                "Provide seven homemade fast food recipes, one for each day from Monday to Sunday. Format each recipe with a header like '**Monday: Recipe Name**', followed by Ingredients and Instructions. Ensure each recipe is quick and includes both ingredients and instructions."
            }
            WeeklyCategory::SavouryMeals => {
                "Provide seven unique savoury meal recipes, one for each day from Monday to Sunday. Format each recipe with a header like '**Monday: Recipe Name**', followed by Ingredients and Instructions. Ensure each recipe is hearty and includes both ingredients and instructions."
            }
            WeeklyCategory::Cakes => {
                "Provide seven unique cake recipes, one for each day from Monday to Sunday. Format each recipe with a header like '**Monday: Cake Name**', followed by Ingredients and Instructions. Ensure each cake includes both ingredients and instructions."
            }
        }
    }
}

impl fmt::Display for WeeklyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for WeeklyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "weekly_recipes" | "weekly" | "dinners" | "dinner" => Ok(WeeklyCategory::Dinners),
            "cocktails" | "cocktail" => Ok(WeeklyCategory::Cocktails),
            "fast_food" => Ok(WeeklyCategory::FastFood),
            "savoury_meals" | "savoury" | "savory" => Ok(WeeklyCategory::SavouryMeals),
            "cakes" | "cake" => Ok(WeeklyCategory::Cakes),
            other => Err(format!(
                "Unknown category '{}', expected one of: {}",
                other,
                WeeklyCategory::ALL.map(|c| c.slug()).join(", ")
            )),
        }
    }
}
