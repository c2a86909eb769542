//! Table and JSON rendering for command results

use anyhow::Result;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use pinballmap_core::catalog::{LocationDiff, Machine, SyncReport};
use pinballmap_core::MatchResult;

pub const NO_MATCHES: &str = "No matches.";

/// One machine per row
#[derive(Tabled)]
pub struct MachineRow {
    id: u64,
    name: String,
    manufacturer: String,
    year: String,
    ipdb_id: String,
}

impl From<&Machine> for MachineRow {
    fn from(machine: &Machine) -> Self {
        Self {
            id: machine.id,
            name: machine.name.clone(),
            manufacturer: machine.manufacturer.clone().unwrap_or_default(),
            year: machine.year.map(|y| y.to_string()).unwrap_or_default(),
            ipdb_id: machine.ipdb_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// Search hit with its score as the last column
#[derive(Tabled)]
pub struct ScoredMachineRow {
    #[tabled(inline)]
    machine: MachineRow,
    score: i32,
}

pub fn render<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

pub fn print_machines(machines: &[Machine], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(machines)?);
    } else {
        let rows: Vec<MachineRow> = machines.iter().map(MachineRow::from).collect();
        println!("{}", render(&rows));
    }
    Ok(())
}

pub fn print_matches(hits: &[MatchResult<Machine>], scores: bool, json: bool) -> Result<()> {
    match (json, scores) {
        (true, true) => println!("{}", serde_json::to_string_pretty(hits)?),
        (true, false) => {
            let machines: Vec<&Machine> = hits.iter().map(|hit| &hit.item).collect();
            println!("{}", serde_json::to_string_pretty(&machines)?);
        }
        (false, true) => {
            let rows: Vec<ScoredMachineRow> = hits
                .iter()
                .map(|hit| ScoredMachineRow {
                    machine: MachineRow::from(&hit.item),
                    score: hit.score,
                })
                .collect();
            println!("{}", render(&rows));
        }
        (false, false) => {
            let rows: Vec<MachineRow> = hits.iter().map(|hit| MachineRow::from(&hit.item)).collect();
            println!("{}", render(&rows));
        }
    }
    Ok(())
}

/// Machines at a location as ids, JSON, or a table
pub fn location_listing(machines: &[Machine], id_only: bool, json: bool) -> Result<String> {
    if machines.is_empty() {
        return Ok(NO_MATCHES.to_string());
    }
    Ok(if id_only {
        id_list(machines.iter().map(|m| &m.id))
    } else if json {
        serde_json::to_string_pretty(machines)?
    } else {
        let rows: Vec<MachineRow> = machines.iter().map(MachineRow::from).collect();
        render(&rows)
    })
}

/// Comma-separated ids, the format `compare` and `sync` accept
pub fn id_list<'a>(ids: impl IntoIterator<Item = &'a u64>) -> String {
    ids.into_iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn print_diff(diff: &LocationDiff) {
    println!("add:       {}", id_list(&diff.add));
    println!("remove:    {}", id_list(&diff.remove));
    println!("unchanged: {}", id_list(&diff.ignore));
    if diff.is_in_sync() {
        println!("\nLocation is in sync.");
    }
}

pub fn print_sync_report(report: &SyncReport) {
    println!(
        "Added {}, removed {}, unchanged {}.",
        report.added, report.removed, report.ignored
    );
    for (machine_id, message) in &report.errors {
        println!("  {machine_id}: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(id: u64, name: &str, year: Option<i32>) -> Machine {
        Machine {
            id,
            name: name.to_string(),
            manufacturer: Some("Williams".to_string()),
            year,
            ipdb_id: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_machine_row_blanks_missing_fields() {
        let row = MachineRow::from(&machine(1, "Fish Tales", None));
        assert_eq!(row.year, "");
        assert_eq!(row.ipdb_id, "");
        assert_eq!(row.manufacturer, "Williams");
    }

    #[test]
    fn test_render_has_headers_and_rows() {
        let rows = vec![MachineRow::from(&machine(1, "Medieval Madness", Some(1997)))];
        let table = render(&rows);

        for header in ["id", "name", "manufacturer", "year", "ipdb_id"] {
            assert!(table.contains(header), "missing header {header}");
        }
        assert!(table.contains("Medieval Madness"));
        assert!(table.contains("1997"));
    }

    #[test]
    fn test_scored_row_adds_score_column() {
        let rows = vec![ScoredMachineRow {
            machine: MachineRow::from(&machine(1, "Fish Tales", Some(1992))),
            score: 28,
        }];
        let table = render(&rows);
        assert!(table.contains("score"));
        assert!(table.contains("28"));
    }

    #[test]
    fn test_empty_location_listing() {
        for (id_only, json) in [(false, false), (true, false), (false, true)] {
            assert_eq!(location_listing(&[], id_only, json).unwrap(), "No matches.");
        }
    }

    #[test]
    fn test_location_listing_formats() {
        let machines = vec![
            machine(4, "Godzilla (Pro)", Some(2021)),
            machine(1, "Medieval Madness", Some(1997)),
        ];
        assert_eq!(location_listing(&machines, true, false).unwrap(), "4,1");
        assert!(location_listing(&machines, false, false)
            .unwrap()
            .contains("Godzilla (Pro)"));
        let json: serde_json::Value =
            serde_json::from_str(&location_listing(&machines, false, true).unwrap()).unwrap();
        assert_eq!(json[1]["id"], 1);
    }

    #[test]
    fn test_id_list() {
        assert_eq!(id_list(&[3, 1, 2]), "3,1,2");
        assert_eq!(id_list(&Vec::<u64>::new()), "");
    }
}
