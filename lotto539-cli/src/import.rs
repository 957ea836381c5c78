use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use lotto539_db::rusqlite::Connection;
use std::path::Path;

use lotto539_db::db::insert_draw;
use lotto539_db::models::{Draw, PICK_COUNT};

// En-têtes du fichier historique : 總期數 (numéro de tirage), 年份 (année),
// 日期 (« M月D日 »), 球號 1..5. Les autres colonnes sont ignorées.
const COL_SEQUENCE: &str = "總期數";
const COL_YEAR: &str = "年份";
const COL_DATE: &str = "日期";
const COL_BALL_PREFIX: &str = "球號";

struct Columns {
    sequence: usize,
    year: usize,
    date: usize,
    balls: [usize; PICK_COUNT],
}

fn normalize_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn locate_columns(headers: &csv::StringRecord) -> Result<Columns> {
    let names: Vec<String> = headers.iter().map(normalize_header).collect();
    let find = |name: &str| -> Result<usize> {
        names
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Colonne manquante : '{}'", name))
    };

    let mut balls = [0usize; PICK_COUNT];
    for (i, slot) in balls.iter_mut().enumerate() {
        *slot = find(&format!("{}{}", COL_BALL_PREFIX, i + 1))?;
    }

    Ok(Columns {
        sequence: find(COL_SEQUENCE)?,
        year: find(COL_YEAR)?,
        date: find(COL_DATE)?,
        balls,
    })
}

/// « 1月5日 » + « 2024 » → 2024-01-05
pub fn parse_date(year: &str, month_day: &str) -> Result<NaiveDate> {
    let year: i32 = year
        .trim()
        .parse()
        .with_context(|| format!("Année invalide : '{}'", year))?;
    let md = month_day.trim().trim_end_matches('日');
    let Some((month, day)) = md.split_once('月') else {
        bail!("Format de date invalide : '{}'", month_day);
    };
    let month: u32 = month.trim().parse()
        .with_context(|| format!("Mois invalide : '{}'", month_day))?;
    let day: u32 = day.trim().parse()
        .with_context(|| format!("Jour invalide : '{}'", month_day))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("Date inexistante : {}-{}-{}", year, month, day))
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("Champ manquant à l'index {}", idx))
}

fn parse_record(record: &csv::StringRecord, cols: &Columns) -> Result<Draw> {
    let raw_id = field(record, cols.sequence)?;
    let sequence_id: u32 = raw_id
        .parse()
        .with_context(|| format!("Numéro de tirage invalide : '{}'", raw_id))?;
    let date = parse_date(field(record, cols.year)?, field(record, cols.date)?)?;

    let mut numbers = [0u8; PICK_COUNT];
    for (slot, &idx) in numbers.iter_mut().zip(cols.balls.iter()) {
        let s = field(record, idx)?;
        *slot = s
            .parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))?;
    }

    let draw = Draw::new(sequence_id, date, &numbers)
        .with_context(|| format!("Tirage {} invalide", sequence_id))?;
    Ok(draw)
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_from_reader(conn, file)
}

pub fn import_from_reader<R: std::io::Read>(conn: &Connection, reader: R) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let cols = locate_columns(reader.headers().context("En-tête CSV illisible")?)?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        let line = result.total_records;
        match record_result {
            Ok(record) => match parse_record(&record, &cols) {
                Ok(draw) => match insert_draw(&tx, &draw) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        log::warn!("Erreur insertion tirage ligne {}: {:#}", line, e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    log::warn!("Erreur parsing ligne {}: {:#}", line, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    log::info!(
        "import : {} lignes, {} insérées, {} doublons, {} erreurs",
        result.total_records, result.inserted, result.skipped, result.errors
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto539_db::db::{count_draws, fetch_all_draws, migrate};

    const SAMPLE: &str = "\
總期數,年份,日期,期數,球號 1,球號 2,球號 3,球號 4,球號 5,出牌次數,數字,次數高至低
1,2024,1月2日,1,05,12,19,33,38,,,
2,2024,1月3日,2,01,08,17,26,35,,,
3,2024,1月4日,3,01,08,17,26,40,,,
2,2024,1月3日,2,01,08,17,26,35,,,
4,2024,2月30日,4,02,04,06,08,10,,,
5,2024,1月6日,5,09,09,10,11,12,,,
";

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024", "1月5日").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(parse_date("2023", "12月31日").unwrap(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert!(parse_date("2024", "2024/01/05").is_err());
        assert!(parse_date("2024", "2月30日").is_err());
        assert!(parse_date("abc", "1月5日").is_err());
    }

    #[test]
    fn test_import_sample() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let result = import_from_reader(&conn, SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.total_records, 6);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        // Numéro 40, date inexistante, doublon 9.
        assert_eq!(result.errors, 3);

        assert_eq!(count_draws(&conn).unwrap(), 2);
        let draws = fetch_all_draws(&conn).unwrap();
        assert_eq!(draws[0].numbers, [5, 12, 19, 33, 38]);
        assert_eq!(draws[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[test]
    fn test_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let csv = "總期數,年份,日期,球號 1,球號 2\n1,2024,1月2日,1,2\n";
        assert!(import_from_reader(&conn, csv.as_bytes()).is_err());
    }
}
