use crate::models::Card;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub fn get_csv_files(flashcards_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if flashcards_dir.is_dir()
        && let Ok(entries) = fs::read_dir(flashcards_dir)
    {
        for entry in entries.flatten() {
            if let Some(ext) = entry.path().extension()
                && ext == "csv"
            {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    files
}

/// Set id of a deck file: its file stem.
pub fn deck_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Loads a deck. Rows are `term,explanation` (the id is the 1-based row
/// number) or `id,term,explanation`. Rows missing a term or explanation are
/// skipped, and a repeated id keeps its first row.
pub fn load_csv(path: &Path) -> std::io::Result<Vec<Card>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_deck(&content))
}

pub fn parse_deck(content: &str) -> Vec<Card> {
    let mut cards = Vec::new();
    let mut ids = HashSet::new();

    for (row, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_csv_line(line);
        let (id, term, explanation) = match fields.as_slice() {
            [term, explanation] => ((row + 1).to_string(), term, explanation),
            [id, term, explanation, ..] => (id.trim().to_string(), term, explanation),
            _ => continue,
        };

        if id.is_empty() || term.trim().is_empty() || explanation.trim().is_empty() {
            continue;
        }
        if ids.insert(id.clone()) {
            cards.push(Card::new(id, term.trim(), explanation.trim()));
        }
    }

    cards
}

/// Splits one CSV line. Quoted fields may contain commas, and `""` inside
/// quotes is a literal quote.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut chars = line.chars().peekable();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => {
                in_quotes = true;
            }
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => {
                current.push(c);
            }
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CardId;

    #[test]
    fn test_parse_csv_simple() {
        assert_eq!(parse_csv_line("Hundreds,Third digit from the right"), vec![
            "Hundreds",
            "Third digit from the right"
        ]);
    }

    #[test]
    fn test_parse_csv_with_quotes() {
        let fields = parse_csv_line("\"What is 2+2?\",\"Four\"");
        assert_eq!(fields, vec!["What is 2+2?", "Four"]);
    }

    #[test]
    fn test_parse_csv_with_commas_in_fields() {
        let fields = parse_csv_line("\"1,000\",\"One thousand, ten hundreds\"");
        assert_eq!(fields, vec!["1,000", "One thousand, ten hundreds"]);
    }

    #[test]
    fn test_parse_csv_with_escaped_quotes() {
        let line = "\"What is \"\"quoted\"\"?\",\"Answer with \"\"quotes\"\"\"";
        let fields = parse_csv_line(line);
        assert_eq!(fields, vec!["What is \"quoted\"?", "Answer with \"quotes\""]);
    }

    #[test]
    fn test_parse_csv_empty_fields() {
        assert_eq!(parse_csv_line(","), vec!["", ""]);
    }

    #[test]
    fn test_parse_csv_three_fields() {
        let fields = parse_csv_line("pv-1,Tens,\"Second digit, from the right\"");
        assert_eq!(fields, vec!["pv-1", "Tens", "Second digit, from the right"]);
    }

    #[test]
    fn test_parse_deck_row_ids() {
        let deck = "Ones,First digit\n\nTens,Second digit\n";
        let cards = parse_deck(deck);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, CardId::from("1"));
        // Row numbers count blank lines so ids stay stable when rows are added below.
        assert_eq!(cards[1].id, CardId::from("3"));
        assert_eq!(cards[1].term, "Tens");
    }

    #[test]
    fn test_parse_deck_explicit_ids_and_skips() {
        let deck = "a,Ones,First digit\nb,,Missing term\na,Dupe,Ignored\nc,Hundreds,Third digit\nlonely";
        let cards = parse_deck(deck);
        let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(cards[0].term, "Ones");
    }

    #[test]
    fn test_load_csv_and_list_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("b.csv"), "Ones,First digit\n").unwrap();
        fs::write(temp_dir.path().join("a.csv"), "Tens,Second digit\n").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let files = get_csv_files(temp_dir.path());
        assert_eq!(files.len(), 2);
        assert_eq!(deck_name(&files[0]), "a");

        let cards = load_csv(&files[1]).unwrap();
        assert_eq!(cards, vec![Card::new("1", "Ones", "First digit")]);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(get_csv_files(&temp_dir.path().join("absent")).is_empty());
    }
}
