//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::CredentialRecord;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of credential metadata. Secrets are never shown here.
pub fn print_records_table(records: &[CredentialRecord]) {
    if records.is_empty() {
        info("No credentials in this vault yet.");
        tip("Run `credvault set <KEY>` to add your first credential.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Key", "Kind", "Name", "App", "Updated"]);

    for r in records {
        table.add_row(vec![
            r.key.clone(),
            r.kind().to_string(),
            r.display_name.clone().unwrap_or_default(),
            r.app_id.clone(),
            r.modified_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print every field of one record, secrets included.
pub fn print_record(record: &CredentialRecord) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["key", record.key.as_str()]);
    table.add_row(vec!["kind", record.kind().as_str()]);
    if let Some(name) = &record.display_name {
        table.add_row(vec!["name", name.as_str()]);
    }
    for (field, value) in record.data.fields() {
        table.add_row(vec![field, value]);
    }
    for (field, value) in &record.custom {
        table.add_row(vec![field.as_str(), value.as_str()]);
    }

    println!("{table}");
}
