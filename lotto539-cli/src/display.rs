use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use textplots::Plot;

use lotto539_db::models::Draw;
use lotto539_engine::BacktestResult;
use lotto539_engine::Strategy;
use lotto539_engine::cooccurrence::PairEntry;
use lotto539_engine::recommend::{Completion, RankedNumber};
use lotto539_engine::scoring::{ScoreResult, Verdict};
use lotto539_engine::stats::{FrequencyTable, NumberStats, NumberTag};

use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Tirage", "Date", "Numéros", "Somme"]);
    for draw in draws {
        let sum: u32 = draw.numbers.iter().map(|&n| n as u32).sum();
        table.add_row(vec![
            draw.sequence_id.to_string(),
            draw.date.format("%Y-%m-%d").to_string(),
            format_numbers(&draw.numbers),
            sum.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {} (voir RUST_LOG=warn)", result.errors);
    }
}

pub fn display_stats(stats: &[NumberStats], window: usize) {
    println!("\n📊 Statistiques sur les {} derniers tirages\n", window);

    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard", "Tag"]);

    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for stat in &sorted {
        let color = match stat.tag {
            NumberTag::Hot => Color::Red,
            NumberTag::Cold => Color::Blue,
            NumberTag::Normal => Color::White,
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", stat.number)),
            Cell::new(stat.frequency),
            Cell::new(stat.gap),
            Cell::new(stat.tag.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_pairs(pairs: &[PairEntry], span: usize) {
    println!("\n🔗 Paires les plus fréquentes ({} derniers tirages)\n", span);
    if pairs.is_empty() {
        println!("  (Aucune paire)");
        return;
    }

    let mut table = new_table(vec!["#", "Paire", "Sorties"]);
    for (i, pair) in pairs.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:02} & {:02}", pair.a, pair.b),
            pair.count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_successors(seed: u8, successors: &FrequencyTable, top: usize) {
    println!(
        "\n➡️  Numéros sortis au tirage suivant un {:02} ({} occurrences)\n",
        seed, successors.draws
    );
    if successors.draws == 0 {
        println!("  (Le {:02} n'est jamais suivi d'un tirage)", seed);
        return;
    }

    let mut table = new_table(vec!["Numéro", "Sorties", "Part"]);
    for (number, count) in successors.present().into_iter().take(top) {
        let share = count as f64 / successors.draws as f64;
        table.add_row(vec![
            format!("{:02}", number),
            count.to_string(),
            format!("{:.1} %", share * 100.0),
        ]);
    }
    println!("{table}");
}

pub fn display_score(result: &ScoreResult) {
    println!("\n🧮 Analyse de la combinaison {}\n", format_numbers(&result.numbers));

    let mut table = new_table(vec!["Verdict", "Détail"]);
    for reason in &result.reasons {
        let verdict = reason.verdict();
        let color = match verdict {
            Verdict::Positive => Color::Green,
            Verdict::Caution => Color::Yellow,
            Verdict::Info => Color::Cyan,
        };
        table.add_row(vec![
            Cell::new(verdict.to_string()).fg(color),
            Cell::new(reason.to_string()),
        ]);
    }
    println!("{table}");

    let m = &result.metrics;
    println!(
        "  Somme {} | {} impairs / {} pairs | {} chauds | {} sorties passées",
        m.sum,
        m.odd_count,
        result.numbers.len() - m.odd_count,
        m.hot_count,
        m.history_matches
    );
    if m.has_consecutive {
        println!("  Contient des numéros consécutifs.");
    }
    println!("\n  Score : {}/100", result.score);
}

pub fn display_ranking(ranked: &[RankedNumber]) {
    println!("\n🎯 Classement (suiveurs du dernier tirage + bonus de retard)\n");

    let max = ranked.first().map(|r| r.score).unwrap_or(0.0);
    let mut table = new_table(vec!["#", "Numéro", "Score", ""]);
    for (i, r) in ranked.iter().enumerate() {
        let bar = if max > 0.0 {
            "█".repeat((r.score / max * 30.0).round() as usize)
        } else {
            String::new()
        };
        table.add_row(vec![
            (i + 1).to_string(),
            format!("{:02}", r.number),
            format!("{:.2}", r.score),
            bar,
        ]);
    }
    println!("{table}");
}

pub fn display_completion(completion: &Completion) {
    match completion {
        Completion::NoHistoricalMatch { fixed } => {
            println!("Aucun tirage passé ne contient {}.", format_numbers(fixed));
        }
        Completion::Suggested { fixed, matching_draws, picks } => {
            println!(
                "\n🧩 Complément de {} ({} tirages correspondants)\n",
                format_numbers(fixed),
                matching_draws
            );
            let mut table = new_table(vec!["Numéro", "Sorties communes"]);
            for pick in picks {
                table.add_row(vec![format!("{:02}", pick.number), pick.count.to_string()]);
            }
            println!("{table}");

            let mut grid: Vec<u8> = fixed.iter().copied().chain(picks.iter().map(|p| p.number)).collect();
            grid.sort_unstable();
            println!("  Grille : {}", format_numbers(&grid));
        }
    }
}

pub fn display_suggestion(strategy: Strategy, window: usize, picks: &[u8]) {
    println!(
        "🎲 Suggestion {} (fenêtre {}) : {}",
        strategy,
        window,
        format_numbers(picks)
    );
}

pub fn display_backtest(results: &[BacktestResult]) {
    let Some(first) = results.first() else {
        return;
    };
    println!(
        "\n== Backtest sur {} tirages (fenêtre {}, départ #{}) ==\n",
        first.span(),
        first.window,
        first.start
    );

    let mut table = new_table(vec![
        "Stratégie", "0", "1", "2", "3", "4", "5", "Moyenne", "≥ 2",
    ]);
    for result in results {
        let mut row = vec![Cell::new(result.strategy.to_string())];
        row.extend(result.histogram.iter().map(|&c| Cell::new(c)));
        row.push(Cell::new(format!("{:.3}", result.mean_hits())));
        row.push(Cell::new(format!("{:.1} %", result.hit_rate(2) * 100.0)));
        table.add_row(row);
    }
    println!("{table}");

    display_backtest_chart(results);
}

/// Cumul des numéros trouvés au fil des tirages rejoués.
fn display_backtest_chart(results: &[BacktestResult]) {
    let curves: Vec<(Strategy, Vec<(f32, f32)>)> = results
        .iter()
        .map(|r| {
            let mut total = 0f32;
            let points = r
                .hits
                .iter()
                .enumerate()
                .map(|(i, &h)| {
                    total += h as f32;
                    ((i + 1) as f32, total)
                })
                .collect();
            (r.strategy, points)
        })
        .collect();

    let x_max = curves.iter().map(|(_, p)| p.len()).max().unwrap_or(0) as f32;
    let y_max = curves
        .iter()
        .filter_map(|(_, p)| p.last().map(|&(_, y)| y))
        .fold(0f32, f32::max);
    if x_max < 2.0 || y_max <= 0.0 {
        println!("  (Pas de données à afficher)");
        return;
    }

    println!("\n== Numéros trouvés (cumul) ==\n");
    for (strategy, points) in &curves {
        println!("  {} :", strategy);
        let shape = textplots::Shape::Lines(points);
        let mut chart = textplots::Chart::new_with_y_range(120, 40, 1.0, x_max, 0.0, y_max + 1.0);
        println!("{}", chart.lineplot(&shape));
    }
}
