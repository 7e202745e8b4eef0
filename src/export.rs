//! Recipe cards as documents: an A4 PDF for download and the same layout as
//! markdown for the terminal.

use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::path::Path;

use crate::error::RecipeError;
use crate::model::Recipe;

/// File name used for a whole weekly set
pub const WEEKLY_PDF_FILE_NAME: &str = "weekly_recipes.pdf";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const INDENT: f32 = 30.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const TITLE_HEIGHT: f32 = 10.0;
const LINE_HEIGHT: f32 = 7.0;
const RECIPE_GAP: f32 = 12.0;
// keep a title together with the first lines of its card
const MIN_CARD_SPACE: f32 = 40.0;
const PT_TO_MM: f32 = 0.3528;

/// Title shown on a recipe card, `"<Day>: <Name>"` for weekly sets
pub fn recipe_title(recipe: &Recipe) -> String {
    if recipe.day.is_empty() {
        recipe.name.clone()
    } else {
        format!("{}: {}", recipe.day, recipe.name)
    }
}

/// Render a single recipe card as markdown
pub fn render_recipe(recipe: &Recipe) -> String {
    let mut out = format!("# {}\n", recipe_title(recipe));

    if let Some(url) = &recipe.image_url {
        out.push_str(&format!("\n![{}]({})\n", recipe.name, url));
    }

    out.push_str("\nIngredients:\n");
    for ingredient in &recipe.ingredients {
        out.push_str(&format!("- {}\n", ingredient));
    }

    out.push_str("\nInstructions:\n");
    for (i, step) in recipe.instructions.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, step));
    }

    out
}

/// Render recipe cards one after another, separated by a horizontal rule
pub fn render_recipes(recipes: &[Recipe]) -> String {
    recipes
        .iter()
        .map(render_recipe)
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

/// Download name for a single recipe, e.g. `lemon_tart.pdf`
pub fn pdf_file_name(recipe: &Recipe) -> String {
    let stem = recipe
        .name
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        "recipe.pdf".to_string()
    } else {
        format!("{}.pdf", stem)
    }
}

/// One positioned line of text; coordinates in millimetres from the bottom left
#[derive(Debug, Clone, PartialEq)]
struct PdfLine {
    text: String,
    size: f32,
    bold: bool,
    x: f32,
    y: f32,
}

struct PageLayout {
    pages: Vec<Vec<PdfLine>>,
    y: f32,
}

impl PageLayout {
    fn new() -> Self {
        PageLayout {
            pages: vec![Vec::new()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_space(&mut self, space: f32) {
        let page_is_empty = self.pages.last().map_or(true, Vec::is_empty);
        if self.y - space < MARGIN && !page_is_empty {
            self.new_page();
        }
    }

    fn text(&mut self, text: &str, size: f32, bold: bool, x: f32, height: f32) {
        // Helvetica averages about half an em per character
        let width = ((PAGE_WIDTH - MARGIN - x) / (size * 0.5 * PT_TO_MM)) as usize;
        for chunk in wrap(text, width.max(1)) {
            if self.y < MARGIN {
                self.new_page();
            }
            let y = self.y;
            if let Some(page) = self.pages.last_mut() {
                page.push(PdfLine {
                    text: chunk,
                    size,
                    bold,
                    x,
                    y,
                });
            }
            self.y -= height;
        }
    }

    fn card(&mut self, recipe: &Recipe) {
        self.ensure_space(MIN_CARD_SPACE);
        self.text(&recipe_title(recipe), TITLE_SIZE, true, MARGIN, TITLE_HEIGHT);

        if let Some(url) = &recipe.image_url {
            self.text(&format!("Image: {}", url), BODY_SIZE, false, MARGIN, LINE_HEIGHT);
        }

        self.text("Ingredients:", BODY_SIZE, true, MARGIN, LINE_HEIGHT);
        for ingredient in &recipe.ingredients {
            self.text(&format!("- {}", ingredient), BODY_SIZE, false, INDENT, LINE_HEIGHT);
        }

        self.text("Instructions:", BODY_SIZE, true, MARGIN, LINE_HEIGHT);
        for (i, step) in recipe.instructions.iter().enumerate() {
            self.text(&format!("{}. {}", i + 1, step), BODY_SIZE, false, INDENT, LINE_HEIGHT);
        }

        self.y -= RECIPE_GAP;
    }
}

fn layout_pages(recipes: &[Recipe]) -> Vec<Vec<PdfLine>> {
    let mut layout = PageLayout::new();
    for recipe in recipes {
        layout.card(recipe);
    }
    layout.pages
}

/// Greedy word wrap at `width` characters. Words longer than a line stay whole.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.chars().count() + 1 + word.chars().count();
        if !current.is_empty() && needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn pdf_error(e: impl std::fmt::Display) -> RecipeError {
    RecipeError::Pdf(e.to_string())
}

/// Lay the recipe cards out on A4 pages and return the encoded PDF
pub fn render_pdf(recipes: &[Recipe]) -> Result<Vec<u8>, RecipeError> {
    let document_title = match recipes {
        [only] => recipe_title(only),
        _ => "Chef Quirky recipes".to_string(),
    };

    let (doc, first_page, first_layer) =
        PdfDocument::new(document_title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    for (index, lines) in layout_pages(recipes).iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);
        for line in lines {
            let font = if line.bold { &bold } else { &regular };
            layer.use_text(line.text.as_str(), line.size, Mm(line.x), Mm(line.y), font);
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

/// Render the cards and save them at `path`
pub async fn write_pdf(path: impl AsRef<Path>, recipes: &[Recipe]) -> Result<(), RecipeError> {
    let bytes = render_pdf(recipes)?;
    tokio::fs::write(path.as_ref(), bytes).await?;
    log::info!(
        "Saved {} recipe(s) to {}",
        recipes.len(),
        path.as_ref().display()
    );
    Ok(())
}
