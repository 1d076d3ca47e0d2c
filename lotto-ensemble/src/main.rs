use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;

use lotto_db::db::{count_draws, db_path, fetch_history, migrate, open_db};
use lotto_db::rusqlite::Connection;
use lotto_ensemble::backtest;
use lotto_ensemble::champion::{self, SelectionPolicy};
use lotto_ensemble::config::{PipelineConfig, ShortSetPolicy, load_config, save_config};
use lotto_ensemble::display;
use lotto_ensemble::features::current_features;
use lotto_ensemble::pipeline::{Retrainer, SqliteHistory};
use lotto_ensemble::sampler::date_seed;

#[derive(Parser)]
#[command(name = "lotto-ensemble", about = "Loto 6/45 : backtest et prédiction par classifieurs")]
struct Cli {
    /// Fichier de configuration du pipeline
    #[arg(short, long, global = true, default_value = "lotto-config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Évaluer toutes les familles sur le dernier tirage connu
    Backtest {
        /// Seed pour la reproductibilité (défaut: date du jour YYYYMMDD)
        #[arg(long)]
        seed: Option<u64>,

        /// Nombre de grilles jouées par famille
        #[arg(short, long)]
        trials: Option<usize>,
    },

    /// Réentraîner puis proposer des grilles pour le prochain tirage
    Predict {
        /// Nombre de grilles par champion
        #[arg(short, long)]
        sets: Option<usize>,

        /// Seed pour la reproductibilité (défaut: date du jour YYYYMMDD)
        #[arg(long)]
        seed: Option<u64>,

        /// Critère du champion (défaut: les deux)
        #[arg(short, long, value_enum)]
        policy: Option<SelectionPolicy>,

        /// Traitement des grilles incomplètes
        #[arg(long, value_enum)]
        short_sets: Option<ShortSetPolicy>,
    },

    /// Afficher les features courantes des 45 numéros
    Features,

    /// Écrire la configuration par défaut
    Config {
        /// Fichier de sortie (défaut: --config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Backtest { seed, trials } => cmd_backtest(&cli.config, seed, trials),
        Command::Predict { sets, seed, policy, short_sets } => {
            cmd_predict(&cli.config, sets, seed, policy, short_sets)
        }
        Command::Features => cmd_features(&cli.config),
        Command::Config { output } => cmd_config(output.as_deref().unwrap_or(&cli.config)),
    }
}

fn open_history() -> Result<(PathBuf, Connection)> {
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;
    Ok((path, conn))
}

fn resolve_config(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        println!("(Pas de fichier {}, configuration par défaut)", path.display());
        return Ok(PipelineConfig::default());
    }
    load_config(path)
}

fn resolve_seed(config: &mut PipelineConfig, seed: Option<u64>) {
    if seed.is_some() {
        config.seed = seed;
    }
    if config.seed.is_none() {
        let ds = date_seed();
        println!("(Seed du jour : {ds})");
        config.seed = Some(ds);
    }
}

fn ensure_history(conn: &Connection, config: &PipelineConfig) -> Result<()> {
    let n = count_draws(conn)? as usize;
    if n == 0 {
        bail!("Base vide. Lancez d'abord : lotto import");
    }
    if n < config.min_history() {
        bail!("Historique trop court : {} tirages, {} requis", n, config.min_history());
    }
    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn cmd_backtest(config_path: &Path, seed: Option<u64>, trials: Option<usize>) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    let (_, conn) = open_history()?;
    ensure_history(&conn, &config)?;
    resolve_seed(&mut config, seed);
    if let Some(t) = trials {
        config.trials_per_family = t;
    }
    config.validate()?;

    let history = fetch_history(&conn)?;
    let families = config.build_families();
    let mut rng = StdRng::seed_from_u64(config.effective_seed());

    let pb = spinner(&format!("Backtest de {} familles sur {} tirages", families.len(), history.len()))?;
    let outcome = backtest::evaluate(
        &history,
        &families,
        &config.windows,
        config.trials_per_family,
        config.short_set_policy,
        &mut rng,
    );
    pb.finish_and_clear();
    let outcome = outcome?;

    display::display_backtest(&outcome.report);

    let scores = outcome.scores();
    let by_rank = champion::select(&scores, SelectionPolicy::BestRankFirst)?;
    let by_wins = champion::select(&scores, SelectionPolicy::MostWinsFirst)?;
    display::display_champions(by_rank, by_wins);

    Ok(())
}

fn cmd_predict(
    config_path: &Path,
    sets: Option<usize>,
    seed: Option<u64>,
    policy: Option<SelectionPolicy>,
    short_sets: Option<ShortSetPolicy>,
) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    let (db, conn) = open_history()?;
    ensure_history(&conn, &config)?;
    resolve_seed(&mut config, seed);
    if let Some(s) = sets {
        config.sets_to_generate = s;
    }
    if let Some(p) = short_sets {
        config.short_set_policy = p;
    }

    let sets_to_generate = config.sets_to_generate;
    let retrainer = Retrainer::new(SqliteHistory::new(&db), config)?;

    let pb = spinner("Backtest, sélection des champions et réentraînement")?;
    let snapshot = retrainer.retrain();
    pb.finish_and_clear();
    let snapshot = snapshot?;

    println!(
        "Entraîné le {} sur {} tirages (dernier : {})",
        snapshot.trained_at.format("%Y-%m-%d %H:%M"),
        snapshot.history_len,
        snapshot.last_draw_index
    );
    display::display_scores(&snapshot.backtest.scores());
    display::display_champions(&snapshot.champion_rank, &snapshot.champion_wins);

    let policies: Vec<SelectionPolicy> = match policy {
        Some(p) => vec![p],
        None => SelectionPolicy::ALL.to_vec(),
    };

    let mut rng = StdRng::seed_from_u64(retrainer.config().effective_seed());
    for policy in policies {
        let predictions = snapshot.predict(policy, sets_to_generate, &mut rng);
        display::display_predictions(policy, snapshot.champion(policy), &predictions);
    }

    Ok(())
}

fn cmd_features(config_path: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let (_, conn) = open_history()?;
    let n = count_draws(&conn)?;
    if n == 0 {
        bail!("Base vide. Lancez d'abord : lotto import");
    }

    let history = fetch_history(&conn)?;
    let features = current_features(&history, &config.windows);
    display::display_features(&features, history.len());
    Ok(())
}

fn cmd_config(output: &Path) -> Result<()> {
    let config = PipelineConfig::default();
    save_config(&config, output)?;
    display::display_families(&config.build_families());
    println!("\nConfiguration écrite dans : {}", output.display());
    Ok(())
}
