//! Turns a free-text Chef Quirky reply into recipe cards.
//!
//! The reply is walked line by line through a small state machine:
//! prose before the first bold header feeds the quirky intro, a bold
//! `**...**` header opens a recipe, `Ingredients:` / `Instructions:` lines
//! switch the active list, and bulleted or numbered lines are collected into
//! whichever list is active. Parsing never fails; malformed replies simply
//! produce fewer recipes.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::error::ParseError;
use crate::model::{ParseResult, Recipe};

/// Canonical week used for day assignment
pub const DEFAULT_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const TRUNCATION_MARKER: &str = "...";
const PARSE_FAILURE_NOTE: &str = "Failed to parse recipe response.";

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s+(?P<rest>.*)$").expect("bullet pattern"));

// `* **Flour**: 2 cups` and `* **Flour:** 2 cups`
static LABELLED_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*•]\s*\*\*[^*]+(?::\*\*|\*\*:)").expect("labelled bullet pattern")
});

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+(?P<rest>.*)$").expect("ordinal pattern"));

/// What to do with a recipe that is closed before it has both lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncompletePolicy {
    /// Emit it anyway and let the caller validate
    #[default]
    Keep,
    /// Silently discard it
    Drop,
}

/// Tunables for [`RecipeParser`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParserOptions {
    /// Day names in canonical order; also the size of a fixed weekly set
    #[serde(default = "default_days")]
    pub days: Vec<String>,
    #[serde(default = "default_max_intro_words")]
    pub max_intro_words: usize,
    #[serde(default = "default_max_intro_sentences")]
    pub max_intro_sentences: usize,
    #[serde(default = "default_max_intro_paragraphs")]
    pub max_intro_paragraphs: usize,
    #[serde(default)]
    pub incomplete_recipes: IncompletePolicy,
    /// Replies larger than this are rejected with a diagnostic
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: usize,
}

fn default_days() -> Vec<String> {
    DEFAULT_DAYS.iter().map(|d| d.to_string()).collect()
}

fn default_max_intro_words() -> usize {
    100
}

fn default_max_intro_sentences() -> usize {
    4
}

fn default_max_intro_paragraphs() -> usize {
    2
}

fn default_max_input_bytes() -> usize {
    256 * 1024
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            days: default_days(),
            max_intro_words: default_max_intro_words(),
            max_intro_sentences: default_max_intro_sentences(),
            max_intro_paragraphs: default_max_intro_paragraphs(),
            incomplete_recipes: IncompletePolicy::default(),
            max_input_bytes: default_max_input_bytes(),
        }
    }
}

/// Whether the reply is expected to hold one recipe or a set of them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    SingleRecipe,
    MultiRecipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Ingredients,
    Instructions,
}

enum State {
    SeekingIntro,
    InIngredients(Recipe),
    InInstructions(Recipe),
}

impl State {
    fn is_open(&self) -> bool {
        !matches!(self, State::SeekingIntro)
    }

    fn into_recipe(self) -> Option<Recipe> {
        match self {
            State::SeekingIntro => None,
            State::InIngredients(recipe) | State::InInstructions(recipe) => Some(recipe),
        }
    }

    fn section(&self) -> Option<Section> {
        match self {
            State::SeekingIntro => None,
            State::InIngredients(_) => Some(Section::Ingredients),
            State::InInstructions(_) => Some(Section::Instructions),
        }
    }

    fn recipe_mut(&mut self) -> Option<&mut Recipe> {
        match self {
            State::SeekingIntro => None,
            State::InIngredients(recipe) | State::InInstructions(recipe) => Some(recipe),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeParser {
    options: ParserOptions,
}

impl RecipeParser {
    pub fn new(options: ParserOptions) -> Self {
        RecipeParser { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a model reply. Never fails: on an internal error the result is
    /// empty and carries a diagnostic note.
    pub fn parse(&self, text: &str, mode: ParseMode) -> ParseResult {
        match self.try_parse(text, mode) {
            Ok(result) => {
                debug!(
                    "Parsed {} recipe(s), intro of {} word(s)",
                    result.recipes.len(),
                    result.intro_text.split_whitespace().count()
                );
                result
            }
            Err(e) => {
                warn!("Error parsing response: {}", e);
                ParseResult {
                    intro_text: String::new(),
                    recipes: Vec::new(),
                    diagnostic: Some(PARSE_FAILURE_NOTE.to_string()),
                }
            }
        }
    }

    pub fn try_parse(&self, text: &str, mode: ParseMode) -> Result<ParseResult, ParseError> {
        if text.len() > self.options.max_input_bytes {
            return Err(ParseError::InputTooLarge {
                size: text.len(),
                limit: self.options.max_input_bytes,
            });
        }

        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut walk = Walk::new(self, mode, &lines);
        for (index, line) in lines.iter().copied().enumerate() {
            walk.step(index, line);
        }
        Ok(walk.finish())
    }

    /// Force a multi-recipe result to exactly one recipe per configured day.
    ///
    /// Extra recipes are dropped; missing ones are padded with placeholders
    /// named `Placeholder <label> <n>` on the days nobody claimed yet.
    pub fn fill_fixed_set(&self, result: &mut ParseResult, label: &str) {
        let size = self.options.days.len();
        // recipes that found no day go first, then the tail
        while result.recipes.len() > size {
            match result.recipes.iter().rposition(|r| r.day.is_empty()) {
                Some(index) => {
                    let dropped = result.recipes.remove(index);
                    debug!("Dropping '{}', no day left for it", dropped.name);
                }
                None => {
                    debug!("Truncating {} recipes to {}", result.recipes.len(), size);
                    result.recipes.truncate(size);
                }
            }
        }

        let mut used: Vec<String> = result
            .recipes
            .iter()
            .filter(|r| !r.day.is_empty())
            .map(|r| r.day.clone())
            .collect();

        while result.recipes.len() < size {
            let position = result.recipes.len() + 1;
            let day = self
                .options
                .days
                .iter()
                .find(|d| !used.contains(d))
                .cloned()
                .unwrap_or_default();
            used.push(day.clone());
            debug!("Padding {} with placeholder {}", day, position);

            result.recipes.push(Recipe {
                name: format!("Placeholder {} {}", label, position),
                day,
                ingredients: vec!["Ingredient 1".to_string(), "Ingredient 2".to_string()],
                instructions: vec!["Step 1".to_string(), "Step 2".to_string()],
                image_url: None,
            });
        }
    }

    /// Split `"<Day>: rest"` into the canonical day and the trimmed rest
    fn split_day_prefix<'h>(&self, header: &'h str) -> Option<(&str, &'h str)> {
        self.options.days.iter().find_map(|day| {
            let prefix = header.get(..day.len())?;
            let rest = header[day.len()..].strip_prefix(':')?;
            prefix
                .eq_ignore_ascii_case(day)
                .then(|| (day.as_str(), rest.trim()))
        })
    }

    fn ingredient_text(line: &str) -> Option<String> {
        if let Some(m) = LABELLED_BULLET.find(line) {
            return Some(strip_markers(&line[m.end()..]).to_string());
        }
        BULLET
            .is_match(line)
            .then(|| strip_markers(line).to_string())
    }

    fn instruction_text(line: &str) -> Option<String> {
        (ORDINAL.is_match(line) || BULLET.is_match(line)).then(|| strip_markers(line).to_string())
    }

    /// Settle the day of every recipe in a multi-recipe result.
    ///
    /// Explicit `<Day>:` labels are honoured first, in order; a label naming a
    /// day that is already taken is dropped. Every recipe left without a day
    /// then takes the day at its position, or the next free one after it.
    fn assign_days(&self, recipes: &mut [Recipe]) {
        let days = &self.options.days;
        let mut used: Vec<String> = Vec::new();

        for recipe in recipes.iter_mut().filter(|r| !r.day.is_empty()) {
            if used.contains(&recipe.day) {
                debug!("{} already taken, placing '{}' positionally", recipe.day, recipe.name);
                recipe.day.clear();
            } else {
                used.push(recipe.day.clone());
            }
        }

        for (index, recipe) in recipes.iter_mut().enumerate() {
            if !recipe.day.is_empty() {
                continue;
            }
            let free = (0..days.len())
                .map(|offset| &days[(index + offset) % days.len()])
                .find(|d| !used.contains(d))
                .cloned();
            if let Some(day) = free {
                used.push(day.clone());
                recipe.day = day;
            }
        }
    }
}

/// Strip every leading bullet and ordinal, so `- 1. Boil` becomes `Boil`
fn strip_markers(text: &str) -> &str {
    let mut text = text.trim();
    while let Some(rest) = BULLET
        .captures(text)
        .or_else(|| ORDINAL.captures(text))
        .and_then(|caps| caps.name("rest"))
    {
        text = rest.as_str().trim();
    }
    text
}

/// Inner text of a `**...**` line, if it is one
fn header_text(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?.strip_suffix("**")?.trim();
    (!inner.is_empty()).then_some(inner)
}

/// `Ingredients:` / `Instructions:` markers. Bold markers may omit the colon.
fn section_marker(text: &str, bold: bool) -> Option<Section> {
    let lower = text.to_lowercase();
    for (word, section) in [
        ("ingredients", Section::Ingredients),
        ("instructions", Section::Instructions),
    ] {
        if let Some(rest) = lower.strip_prefix(word) {
            if rest.starts_with(':') || (bold && rest.is_empty()) {
                return Some(section);
            }
        }
    }
    None
}

fn sentence_count(line: &str) -> usize {
    line.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

struct Walk<'p, 'a> {
    parser: &'p RecipeParser,
    mode: ParseMode,
    lines: &'a [&'a str],
    state: State,
    recipes: Vec<Recipe>,
    intro_lines: Vec<&'a str>,
    opened_any: bool,
    paragraph_count: usize,
    sentence_count: usize,
}

impl<'p, 'a> Walk<'p, 'a> {
    fn new(parser: &'p RecipeParser, mode: ParseMode, lines: &'a [&'a str]) -> Self {
        Walk {
            parser,
            mode,
            lines,
            state: State::SeekingIntro,
            recipes: Vec::new(),
            intro_lines: Vec::new(),
            opened_any: false,
            paragraph_count: 0,
            sentence_count: 0,
        }
    }

    fn step(&mut self, index: usize, line: &'a str) {
        if line.is_empty() {
            self.blank();
            return;
        }

        if let Some(header) = header_text(line) {
            if self.state.is_open() {
                if let Some(section) = section_marker(header, true) {
                    self.switch(section);
                    return;
                }
                // sub-heading such as **For the sauce:**
                if header.ends_with(':') && self.parser.split_day_prefix(header).is_none() {
                    return;
                }
            }
            self.open(header, index);
            return;
        }

        if self.state.is_open() {
            match section_marker(line, false) {
                Some(section) => self.switch(section),
                None => self.content(line),
            }
        } else {
            self.prose(line);
        }
    }

    fn blank(&mut self) {
        if self.state.is_open() {
            return;
        }
        if self.intro_lines.last().is_some_and(|l| !l.is_empty()) {
            self.paragraph_count += 1;
        }
        self.intro_lines.push("");
    }

    fn prose(&mut self, line: &'a str) {
        self.sentence_count += sentence_count(line);
        let options = &self.parser.options;
        if self.sentence_count <= options.max_intro_sentences
            && self.paragraph_count < options.max_intro_paragraphs
        {
            self.intro_lines.push(line);
        }
    }

    fn switch(&mut self, section: Section) {
        let state = std::mem::replace(&mut self.state, State::SeekingIntro);
        self.state = match (state.into_recipe(), section) {
            (Some(recipe), Section::Ingredients) => State::InIngredients(recipe),
            (Some(recipe), Section::Instructions) => State::InInstructions(recipe),
            (None, _) => State::SeekingIntro,
        };
    }

    fn content(&mut self, line: &str) {
        let item = match self.state.section() {
            Some(Section::Ingredients) => RecipeParser::ingredient_text(line),
            Some(Section::Instructions) => RecipeParser::instruction_text(line),
            None => None,
        };
        let Some(item) = item.filter(|i| !i.is_empty()) else {
            return;
        };
        let section = self.state.section();
        if let Some(recipe) = self.state.recipe_mut() {
            match section {
                Some(Section::Ingredients) => recipe.ingredients.push(item),
                _ => recipe.instructions.push(item),
            }
        }
    }

    fn open(&mut self, header: &str, index: usize) {
        self.close();

        let recipe = match self.mode {
            ParseMode::SingleRecipe => {
                if !self.opened_any && index > 0 {
                    // everything before the first header is the intro
                    self.intro_lines = self.lines[..index].to_vec();
                }
                Recipe::new(header, "")
            }
            // days are settled in `finish`, once every explicit label is known
            ParseMode::MultiRecipe => match self.parser.split_day_prefix(header) {
                Some((day, "")) => Recipe::new(day, day),
                Some((day, name)) => Recipe::new(name, day),
                None => Recipe::new(header, ""),
            },
        };

        self.opened_any = true;
        self.state = State::InIngredients(recipe);
    }

    fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, State::SeekingIntro);
        let Some(recipe) = state.into_recipe() else {
            return;
        };
        match self.parser.options.incomplete_recipes {
            IncompletePolicy::Keep => self.recipes.push(recipe),
            IncompletePolicy::Drop if recipe.is_complete() => self.recipes.push(recipe),
            IncompletePolicy::Drop => debug!("Dropping incomplete recipe '{}'", recipe.name),
        }
    }

    fn finish(mut self) -> ParseResult {
        self.close();

        let mut recipes = self.recipes;
        match self.mode {
            ParseMode::SingleRecipe => recipes.truncate(1),
            ParseMode::MultiRecipe => self.parser.assign_days(&mut recipes),
        }

        let intro = self
            .intro_lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n");

        ParseResult {
            intro_text: cap_words(intro.trim(), self.parser.options.max_intro_words),
            recipes,
            diagnostic: None,
        }
    }
}

fn cap_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}{}", words[..max_words].join(" "), TRUNCATION_MARKER)
    } else {
        text.to_string()
    }
}
