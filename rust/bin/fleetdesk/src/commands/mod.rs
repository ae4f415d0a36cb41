pub mod context;
pub mod resource;
pub mod shipment;

use fleetdesk_admin::{Notice, NoticeLevel};

/// Output format selected with `-o`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Output {
    Table,
    Json,
}

/// Print queued notices: successes and infos to stdout, errors to stderr.
pub fn report(notices: &[Notice]) {
    for n in notices {
        match n.level {
            NoticeLevel::Error => eprintln!("error: {}", n.message),
            NoticeLevel::Success | NoticeLevel::Info => println!("{}", n.message),
        }
    }
}

/// Turn a failed operation into the error returned from `main`, carrying
/// the last error notice as its message. Other notices are printed.
pub fn failure(notices: Vec<Notice>, err: impl Into<anyhow::Error>) -> anyhow::Error {
    let err = err.into();
    let (errors, others): (Vec<Notice>, Vec<Notice>) =
        notices.into_iter().partition(|n| n.level == NoticeLevel::Error);
    report(&others);
    match errors.into_iter().last() {
        Some(n) if n.message != err.to_string() => err.context(n.message),
        _ => err,
    }
}

/// Render rows as a plain aligned text table.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = line(&headers.iter().map(|h| h.to_uppercase()).collect::<Vec<_>>());
    for row in rows {
        out.push('\n');
        out.push_str(&line(row));
    }
    out
}

/// Parse `key=value` pairs from repeated `--set`/`--filter` flags.
pub fn parse_pairs(pairs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| anyhow::anyhow!("expected key=value, got \"{}\"", p))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align() {
        let headers = vec!["ID".to_string(), "Name".to_string()];
        let rows = vec![
            vec!["#1".to_string(), "Sand".to_string()],
            vec!["#12".to_string(), "Crushed stone".to_string()],
        ];
        let out = render_table(&headers, &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID   NAME");
        assert_eq!(lines[1], "#1   Sand");
        assert_eq!(lines[2], "#12  Crushed stone");
    }

    #[test]
    fn failure_uses_last_error_notice() {
        let notices = vec![
            Notice { level: NoticeLevel::Success, message: "ok".into() },
            Notice { level: NoticeLevel::Error, message: "Failed to save materials".into() },
        ];
        let err = failure(notices, anyhow::anyhow!("decode: eof"));
        assert_eq!(err.to_string(), "Failed to save materials");
        assert_eq!(err.root_cause().to_string(), "decode: eof");

        let same = vec![Notice { level: NoticeLevel::Error, message: "in use".into() }];
        assert_eq!(format!("{:#}", failure(same, anyhow::anyhow!("in use"))), "in use");
    }

    #[test]
    fn pairs_split_on_first_equals() {
        let parsed = parse_pairs(&["name=a=b".to_string(), "code=".to_string()]).unwrap();
        assert_eq!(parsed[0], ("name".to_string(), "a=b".to_string()));
        assert_eq!(parsed[1], ("code".to_string(), String::new()));
        assert!(parse_pairs(&["oops".to_string()]).is_err());
        assert!(parse_pairs(&["=x".to_string()]).is_err());
    }
}
