//! Operator CLI for the access registry store.
//!
//! # Responsibility
//! - Verify `access_core` linkage and configuration.
//! - Print read-only views of the configured database.
//!
//! Usage: `access_cli [version|software|roster|departments]`

use access_core::db::open_db;
use access_core::{
    core_version, AccessService, CoreConfig, EmployeeWithAccess, RosterFilter, Software,
    SqliteAccessRepository,
};
use std::collections::HashMap;
use std::process::ExitCode;

fn main() -> ExitCode {
    let command = std::env::args().nth(1).unwrap_or_else(|| "version".to_string());
    match run(command.as_str()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("access_cli {command} failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: &str) -> Result<(), String> {
    if command == "version" {
        println!("access_core version={}", core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    config.init_logging()?;
    log::info!("event=cli_command module=cli status=start command={command}");

    let mut conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let service = AccessService::new(SqliteAccessRepository::new(&mut conn));

    match command {
        "software" => {
            for software in service.list_software().map_err(|err| err.to_string())? {
                println!("{}\t{}", software.id, software.name);
            }
        }
        "roster" => {
            let catalog = service.list_software().map_err(|err| err.to_string())?;
            let roster = service
                .list_employees_with_access(&RosterFilter::default())
                .map_err(|err| err.to_string())?;
            for entry in &roster {
                println!("{}", format_roster_line(entry, &catalog));
            }
        }
        "departments" => {
            for department in service.list_departments().map_err(|err| err.to_string())? {
                println!("{department}");
            }
        }
        other => {
            return Err(format!(
                "unknown command `{other}`; expected version|software|roster|departments"
            ))
        }
    }
    Ok(())
}

fn format_roster_line(entry: &EmployeeWithAccess, catalog: &[Software]) -> String {
    let names: HashMap<_, _> = catalog
        .iter()
        .map(|software| (software.id, software.name.as_str()))
        .collect();
    let grants = if entry.grants.is_empty() {
        "-".to_string()
    } else {
        entry
            .grants
            .iter()
            .map(|grant| {
                let name = names.get(&grant.software_id).copied().unwrap_or("unknown");
                format!("{name} ({})", grant.level.as_str())
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{}\t{}\t{}\t{grants}",
        entry.employee.name, entry.employee.department, entry.employee.role
    )
}
