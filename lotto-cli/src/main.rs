mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lotto_db::db::{count_draws, db_path, fetch_last_draws, insert_draw, last_draw_index, migrate, open_db};
use lotto_db::models::{DrawRecord, PICK_COUNT, POOL_SIZE, validate_draw};
use lotto_db::rusqlite::Connection;
use crate::display::{display_draws, display_import_summary};

#[derive(Parser)]
#[command(name = "lotto", about = "Historique des tirages du Loto 6/45")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV (draw_index;date;n1..n6;bonus)
        #[arg(short, long, default_value = "assets/lotto_645.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Ajouter un tirage manuellement
    Add,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Add => cmd_add(&conn),
    }
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : lotto import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let next = last_draw_index(conn)?.map_or(1, |i| i + 1);
    let raw_index = prompt(&format!("Numéro du tirage [{}] : ", next))?;
    let draw_index: u32 = if raw_index.is_empty() {
        next
    } else {
        raw_index.parse().context("Numéro de tirage invalide")?
    };

    let raw_date = prompt("Date (JJ/MM/AAAA) : ")?;
    let date = import::parse_date(&raw_date)?;

    let (numbers, bonus) = prompt_numbers()?;
    let draw = DrawRecord::new(draw_index, date, numbers, bonus)?;

    println!("\nTirage à insérer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        let inserted = insert_draw(conn, &draw)?;
        if inserted {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }

    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<([u8; PICK_COUNT], u8)> {
    loop {
        let input = prompt(&format!("6 numéros puis le bonus (séparés par des espaces, 1-{}) : ", POOL_SIZE))?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == PICK_COUNT + 1 => {
                let mut numbers = [0u8; PICK_COUNT];
                numbers.copy_from_slice(&v[..PICK_COUNT]);
                let bonus = v[PICK_COUNT];
                match validate_draw(1, &numbers, bonus) {
                    Ok(()) => return Ok((numbers, bonus)),
                    Err(e) => println!("{}. Réessayez.", e),
                }
            }
            _ => println!("Entrez exactement 7 numéros. Réessayez."),
        }
    }
}
