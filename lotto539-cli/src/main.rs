mod display;
mod import;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use lotto539_db::db::{count_draws, db_path, fetch_all_draws, fetch_last_draws, insert_draw, last_draw, migrate, open_db};
use lotto539_db::models::{Draw, POOL_SIZE, check_numbers};
use lotto539_db::rusqlite::Connection;
use lotto539_engine::backtest::{compare_strategies, run_backtest, suggest};
use lotto539_engine::config::{load_config, save_config};
use lotto539_engine::cooccurrence::{pair_counts, successor_counts};
use lotto539_engine::recommend::{complete, rank_numbers, recommend};
use lotto539_engine::scoring::score_candidate;
use lotto539_engine::stats::number_stats;
use lotto539_engine::{EngineConfig, EngineError, EngineResult, History, Strategy};

use crate::display::{
    display_backtest, display_completion, display_draws, display_import_summary, display_pairs,
    display_ranking, display_score, display_stats, display_successors, display_suggestion,
};

const DEFAULT_CONFIG: &str = "lotto539.json";

#[derive(Parser)]
#[command(name = "lotto539", about = "Statistiques et backtests pour le loto 5/39")]
struct Cli {
    /// Fichier de configuration JSON (défaut : ./lotto539.json s'il existe)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sortie JSON au lieu des tableaux
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer l'historique depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV
        #[arg(short, long, default_value = "data/lotto539.csv")]
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

    /// Fréquences et retards sur une fenêtre
    Stats {
        /// Fenêtre d'analyse (défaut : scoring.hot_window)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Paires les plus souvent sorties ensemble
    Pairs {
        /// Nombre de tirages analysés
        #[arg(short, long, default_value = "100")]
        span: usize,

        /// Nombre de paires affichées
        #[arg(short, long, default_value = "15")]
        top: usize,
    },

    /// Numéros sortis au tirage suivant un numéro donné
    Successors {
        number: u8,

        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Noter une combinaison de 5 numéros
    Score {
        #[arg(required = true, num_args = 5)]
        numbers: Vec<u8>,
    },

    /// Classer les numéros pour le prochain tirage
    Recommend {
        /// Poids des suiveurs du dernier tirage [0, 2]
        #[arg(short, long)]
        affinity: Option<f64>,

        /// Poids du bonus de retard [0, 2]
        #[arg(short, long)]
        miss: Option<f64>,

        /// Fenêtre d'analyse des retards
        #[arg(short, long)]
        window: Option<usize>,

        /// Afficher les 39 numéros
        #[arg(long)]
        all: bool,
    },

    /// Compléter 1 à 4 numéros fixés
    Complete {
        #[arg(required = true, num_args = 1..=4)]
        numbers: Vec<u8>,
    },

    /// Grille suggérée par une stratégie pour le prochain tirage
    Suggest {
        #[arg(short, long, default_value = "hot")]
        strategy: Strategy,

        /// Fenêtre de fréquences (défaut : backtest.window)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Rejouer une stratégie (ou les trois) sur les derniers tirages
    Backtest {
        /// Stratégie à rejouer ; toutes si absente
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Nombre de tirages rejoués
        #[arg(long)]
        span: Option<usize>,

        /// Fenêtre de fréquences
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Écrire la configuration par défaut
    Config {
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,

        /// Écraser un fichier existant
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::Config { output, force } = &cli.command {
        return cmd_config(output, *force);
    }

    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;
    let json = cli.json;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last, json),
        Command::Add => cmd_add(&conn),
        Command::Config { .. } => Ok(()),
        command => {
            let config = resolve_config(cli.config.as_deref())?;
            let history = load_history(&conn)?;
            run_analysis(command, &history, &config, json)
        }
    }
}

fn run_analysis(command: Command, history: &History, config: &EngineConfig, json: bool) -> Result<()> {
    // La notation d'une combinaison reste possible sur une base vide.
    if history.is_empty() && !matches!(command, Command::Score { .. }) {
        println!("Base vide. Lancez d'abord : lotto539 import");
        return Ok(());
    }

    match command {
        Command::Stats { window } => {
            let window = window.unwrap_or(config.scoring.hot_window);
            let stats = number_stats(
                history,
                history.len(),
                window,
                config.scoring.hot_threshold,
                config.scoring.cold_gap,
            );
            emit(json, &stats, |s| display_stats(s, window.min(history.len())))
        }
        Command::Pairs { span, top } => {
            let pairs = pair_counts(history, span).top(top);
            emit(json, &pairs, |p| display_pairs(p, span.min(history.len())))
        }
        Command::Successors { number, top } => {
            if number == 0 || number > POOL_SIZE {
                bail!("Numéro {} hors de [1, {}]", number, POOL_SIZE);
            }
            let successors = successor_counts(history, number);
            if json {
                let ranked: Vec<_> = successors.present().into_iter().take(top).collect();
                let value = serde_json::json!({
                    "number": number,
                    "occurrences": successors.draws,
                    "successors": ranked,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                display_successors(number, &successors, top);
            }
            Ok(())
        }
        Command::Score { numbers } => {
            let result = score_candidate(history, &numbers, &config.scoring)?;
            emit(json, &result, display_score)
        }
        Command::Recommend { affinity, miss, window, all } => {
            let mut rc = config.recommend.clone();
            if let Some(a) = affinity {
                rc.affinity_weight = a;
            }
            if let Some(m) = miss {
                rc.miss_weight = m;
            }
            if let Some(w) = window {
                rc.window = w;
            }
            let ranked = if all {
                rank_numbers(history, &rc)
            } else {
                recommend(history, &rc)
            };
            let Some(ranked) = or_not_enough(ranked)? else {
                return Ok(());
            };
            emit(json, &ranked, |r| display_ranking(r))
        }
        Command::Complete { numbers } => {
            let completion = complete(history, &numbers)?;
            emit(json, &completion, display_completion)
        }
        Command::Suggest { strategy, window } => {
            let window = window.unwrap_or(config.backtest.window);
            let Some(picks) = or_not_enough(suggest(history, strategy, window))? else {
                return Ok(());
            };
            if json {
                let value = serde_json::json!({
                    "strategy": strategy,
                    "window": window,
                    "numbers": picks,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                display_suggestion(strategy, window, &picks);
            }
            Ok(())
        }
        Command::Backtest { strategy, span, window } => {
            let mut bc = config.backtest.clone();
            if let Some(s) = span {
                bc.span = s;
            }
            if let Some(w) = window {
                bc.window = w;
            }
            let results = match strategy {
                Some(s) => run_backtest(history, s, &bc).map(|r| vec![r]),
                None => compare_strategies(history, &bc),
            };
            let Some(results) = or_not_enough(results)? else {
                return Ok(());
            };
            emit(json, &results, |r| display_backtest(r))
        }
        Command::Import { .. } | Command::DbPath | Command::List { .. } | Command::Add | Command::Config { .. } => Ok(()),
    }
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, render: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

/// Un historique trop court n'est pas une erreur pour l'utilisateur.
fn or_not_enough<T>(result: EngineResult<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(EngineError::InsufficientHistory { required, available }) => {
            println!(
                "Pas assez de données : {} tirages requis, {} disponibles.",
                required, available
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn resolve_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        log::info!("configuration chargée depuis {}", DEFAULT_CONFIG);
        return load_config(default_path);
    }
    log::info!("pas de fichier {}, paramètres par défaut", DEFAULT_CONFIG);
    Ok(EngineConfig::default())
}

fn load_history(conn: &Connection) -> Result<History> {
    let draws = fetch_all_draws(conn)?;
    let history = History::new(draws).context("Historique incohérent dans la base")?;
    log::debug!("{} tirages chargés", history.len());
    Ok(history)
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32, json: bool) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : lotto539 import");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    emit(json, &draws, |d| display_draws(d))
}

fn cmd_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{:?} existe déjà (utilisez --force pour l'écraser)", output);
    }
    save_config(&EngineConfig::default(), output)?;
    println!("Configuration par défaut écrite dans {}", output.display());
    Ok(())
}

fn cmd_add(conn: &Connection) -> Result<()> {
    println!("Ajout d'un tirage manuellement\n");

    let next_id = last_draw(conn)?.map(|d| d.sequence_id + 1).unwrap_or(1);
    let raw_id = prompt(&format!("Numéro du tirage [{}] : ", next_id))?;
    let sequence_id: u32 = if raw_id.is_empty() {
        next_id
    } else {
        raw_id
            .parse()
            .with_context(|| format!("Numéro de tirage invalide : '{}'", raw_id))?
    };

    let raw_date = prompt("Date (AAAA-MM-JJ) : ")?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .with_context(|| format!("Format de date invalide : '{}'", raw_date))?;

    let numbers = prompt_numbers()?;
    let draw = Draw::new(sequence_id, date, &numbers)?;

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
    read_answer(&mut io::stdin().lock())
}

fn read_answer<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut input = String::new();
    let n = reader
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if n == 0 {
        bail!("Entrée standard fermée, saisie interrompue");
    }
    Ok(input.trim().to_string())
}

fn prompt_numbers() -> Result<[u8; 5]> {
    loop {
        let input = prompt("5 numéros (séparés par des espaces, 1-39) : ")?;
        let nums: Result<Vec<u8>, _> = input.split_whitespace().map(|s| s.parse::<u8>()).collect();
        match nums {
            Ok(v) if v.len() == 5 => {
                let arr = [v[0], v[1], v[2], v[3], v[4]];
                match check_numbers(&arr) {
                    Ok(()) => return Ok(arr),
                    Err(e) => println!("{}. Réessayez.", e),
                }
            }
            _ => println!("Entrez exactement 5 numéros. Réessayez."),
        }
    }
}
