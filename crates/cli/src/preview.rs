//! Tabular preview of the users a run would generate.

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use realmgen_core::identity::IdentityMapper;
use realmgen_core::models::EmployeeRecord;

use super::style;

/// Print one row per record: derived username and email, or the reason the
/// record would be rejected.
pub fn run_preview(mapper: &IdentityMapper, records: &[EmployeeRecord]) {
    if records.is_empty() {
        println!("No employee records found.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Employee ID", "Username", "Email", "Department", "Title"]);

    let mut rejected = 0usize;
    for (index, record) in (1usize..).zip(records) {
        let id = record.id.as_deref().unwrap_or("-");
        match mapper.map_record(record) {
            Ok(user) => {
                let username = if user.username.is_empty() {
                    Cell::new("(empty)").fg(Color::Yellow)
                } else {
                    Cell::new(&user.username)
                };
                table.add_row(vec![
                    Cell::new(index),
                    Cell::new(id),
                    username,
                    Cell::new(&user.email),
                    Cell::new(user.single_attribute("department").unwrap_or("")),
                    Cell::new(user.single_attribute("title").unwrap_or("")),
                ]);
            }
            Err(e) => {
                rejected += 1;
                table.add_row(vec![
                    Cell::new(index),
                    Cell::new(id),
                    Cell::new(format!("✗ missing {}", e.field())).fg(Color::Red),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
        }
    }

    println!("{table}");
    println!();
    let summary = format!(
        "{} record(s), {} mappable, {} rejected",
        records.len(),
        records.len() - rejected,
        rejected
    );
    if rejected == 0 {
        println!("{}", style::success(&summary));
    } else {
        println!("{}", style::warn(&summary));
    }
}
