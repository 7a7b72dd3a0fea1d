//! Satisfactory data extractor
//!
//! Turns the game's `Docs.json` configuration dump into the item, building
//! and recipe tables a production planner consumes.

mod docs;
mod extract;
mod models;
mod output;
mod parse;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::docs::DocsFile;

#[derive(Parser)]
#[command(name = "satisfactory-extractor")]
#[command(about = "Game data extractor for Satisfactory's Docs.json dump")]
struct Cli {
    /// Path to the Docs.json dump
    #[arg(short, long, default_value = "Docs.json")]
    docs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract items, buildings and recipes to JSON files
    Extract {
        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Write a field reference map of every class group in the dump
    Document {
        /// Output file
        #[arg(short, long, default_value = "documentation/map.json")]
        output: PathBuf,
    },

    /// List all production buildings in the dump
    ListBuildings,

    /// List all items referenced by at least one recipe
    ListItems,

    /// Show details for a specific recipe
    Recipe {
        /// Recipe class name
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let docs = DocsFile::load(&cli.docs)?;
    println!(
        "Loaded {} class groups from {}",
        docs.group_count(),
        cli.docs.display()
    );

    match cli.command {
        Commands::Extract { output } => {
            let data = extract::extract_all(&docs);
            output::write_collections(&data, &output)?;
            println!("{}", data.stats);
            println!(
                "Wrote buildings.json, items.json and recipes.json to {}",
                output.display()
            );
        }

        Commands::Document { output } => {
            docs::write_reference_map(&docs, &output)?;
            println!("Wrote {}", output.display());
        }

        Commands::ListBuildings => {
            let data = extract::extract_all(&docs);
            if data.buildings.is_empty() {
                println!("No buildings found in the dump.");
            } else {
                println!("{:<40} {:>10} {:>12}", "Building", "Power (MW)", "Category");
                println!("{}", "-".repeat(64));
                for b in &data.buildings {
                    println!("{:<40} {:>10.1} {:>12}", b.name, b.power, b.category);
                }
            }
        }

        Commands::ListItems => {
            let data = extract::extract_all(&docs);
            if data.items.is_empty() {
                println!("No recipe-referenced items found in the dump.");
            } else {
                for item in &data.items {
                    let kind = if item.is_fluid { "fluid" } else { "solid" };
                    println!("{:<40} {:<6} {}", item.name, kind, item.id);
                }
            }
        }

        Commands::Recipe { id } => {
            let data = extract::extract_all(&docs);
            if let Some(recipe) = data.recipes.iter().find(|r| r.id == id) {
                println!("Recipe: {}", recipe.name);
                println!("  ID: {}", recipe.id);
                if recipe.alternate {
                    println!("  Alternate recipe");
                }
                if let Some(building) = &recipe.building {
                    println!("  Building: {building}");
                }
                println!("  Ingredients:");
                for entry in &recipe.ingredients {
                    println!("    {} @ {:.4}/min", entry.item, entry.amount);
                }
                println!("  Products:");
                for entry in &recipe.product {
                    println!("    {} @ {:.4}/min", entry.item, entry.amount);
                }
            } else {
                println!("Recipe '{id}' not found");
            }
        }
    }

    Ok(())
}
