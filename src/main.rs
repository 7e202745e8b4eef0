use clap::{Parser, Subcommand};
use log::error;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use chef_quirky::export::{pdf_file_name, render_recipes, write_pdf, WEEKLY_PDF_FILE_NAME};
use chef_quirky::{server, AppConfig, ParseMode, RecipeError, RecipeParser, RecipeService, WeeklyCategory};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chef Quirky: quirky recipes from an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on, overrides the configured one
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Generate a single recipe
    Recipe {
        /// What you'd like to cook
        #[arg(required = true)]
        request: Vec<String>,
        /// Skip the illustration
        #[arg(long)]
        no_image: bool,
        /// Print JSON instead of a recipe card
        #[arg(long)]
        json: bool,
        /// Also save the card as a PDF (defaults to `<recipe_name>.pdf`)
        #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true)]
        pdf: Option<Option<PathBuf>>,
    },
    /// Generate a themed set of seven recipes
    Weekly {
        /// weekly_recipes, cocktails, fast_food, savoury_meals or cakes
        category: WeeklyCategory,
        #[arg(long)]
        json: bool,
        /// Also save the set as a PDF (defaults to `weekly_recipes.pdf`)
        #[arg(long, value_name = "FILE", num_args = 0..=1, require_equals = true)]
        pdf: Option<Option<PathBuf>>,
    },
    /// Parse a saved model reply (file or stdin) and print the result as JSON
    Parse {
        file: Option<PathBuf>,
        /// Look for several recipes instead of one
        #[arg(long, conflicts_with = "weekly")]
        multi: bool,
        /// Parse as a weekly set, padded to seven entries
        #[arg(long)]
        weekly: Option<WeeklyCategory>,
    },
    /// Generate an image for a prompt and print its URL
    Image {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RecipeError> {
    let config = AppConfig::load()?;

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let service = Arc::new(RecipeService::from_config(&config)?);
            server::serve(service, &bind).await?;
        }
        Command::Recipe {
            request,
            no_image,
            json,
            pdf,
        } => {
            let service = RecipeService::from_config(&config)?;
            let response = service
                .generate_recipe_with(&request.join(" "), !no_image)
                .await?;
            if json {
                print_json(&response);
            } else {
                println!("{}\n", response.intro_text);
                print!("{}", render_recipes(std::slice::from_ref(&response.recipe)));
            }
            if let Some(file) = pdf {
                let path = file.unwrap_or_else(|| PathBuf::from(pdf_file_name(&response.recipe)));
                write_pdf(path, std::slice::from_ref(&response.recipe)).await?;
            }
        }
        Command::Weekly {
            category,
            json,
            pdf,
        } => {
            let service = RecipeService::from_config(&config)?;
            let response = service.generate_weekly(category).await?;
            if json {
                print_json(&response);
            } else {
                println!("{}\n", response.intro_text);
                print!("{}", render_recipes(&response.recipes));
            }
            if let Some(file) = pdf {
                let path = file.unwrap_or_else(|| PathBuf::from(WEEKLY_PDF_FILE_NAME));
                write_pdf(path, &response.recipes).await?;
            }
        }
        Command::Parse {
            file,
            multi,
            weekly,
        } => {
            let text = match file {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text)?;
                    text
                }
            };

            let parser = RecipeParser::new(config.parser.clone());
            let mode = if multi || weekly.is_some() {
                ParseMode::MultiRecipe
            } else {
                ParseMode::SingleRecipe
            };
            let mut result = parser.parse(&text, mode);
            if let Some(category) = weekly {
                parser.fill_fixed_set(&mut result, category.label());
            }
            print_json(&result);
        }
        Command::Image { prompt } => {
            let service = RecipeService::from_config(&config)?;
            println!("{}", service.generate_image(&prompt.join(" ")).await?);
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Could not serialize output: {}", e),
    }
}
