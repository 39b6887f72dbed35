//! Software catalog and employee roster queries.
//!
//! # Invariants
//! - Software is ordered by `name COLLATE NOCASE ASC, id ASC`.
//! - Employees are ordered by `name COLLATE NOCASE ASC, id ASC`.
//! - Grants inside one employee keep insertion order (`software_access.id`).

use crate::model::access::{AccessGrant, AccessLevel, EmployeeWithAccess};
use crate::model::employee::{Employee, EmployeeId};
use crate::model::software::{Software, SoftwareId};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

const ROSTER_SELECT_SQL: &str = "SELECT
    e.id AS employee_id,
    e.name AS name,
    e.department AS department,
    e.role AS role,
    e.manager AS manager,
    g.software_id AS software_id,
    g.access_level AS access_level
FROM employees e
LEFT JOIN software_access g ON g.employee_id = e.id";

/// Roster filters mirroring the overview screen selectors.
///
/// All set fields must match. `software_id` selects employees holding any
/// grant on that software; their full grant list is still returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    pub employee_id: Option<EmployeeId>,
    pub department: Option<String>,
    pub software_id: Option<SoftwareId>,
}

/// Lists all software titles.
pub fn list_software(conn: &Connection) -> RepoResult<Vec<Software>> {
    let mut stmt = conn.prepare(
        "SELECT id, name
         FROM software
         ORDER BY name COLLATE NOCASE ASC, id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut software = Vec::new();
    while let Some(row) = rows.next()? {
        software.push(Software {
            id: row.get("id")?,
            name: row.get("name")?,
        });
    }
    Ok(software)
}

/// Gets one software title by id.
pub fn get_software(conn: &Connection, id: SoftwareId) -> RepoResult<Option<Software>> {
    let software = conn
        .query_row(
            "SELECT id, name FROM software WHERE id = ?1;",
            [id],
            |row| {
                Ok(Software {
                    id: row.get("id")?,
                    name: row.get("name")?,
                })
            },
        )
        .optional()?;
    Ok(software)
}

/// Lists employees joined with their grants.
pub fn list_employees_with_access(
    conn: &Connection,
    filter: &RosterFilter,
) -> RepoResult<Vec<EmployeeWithAccess>> {
    let mut sql = format!("{ROSTER_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        sql.push_str(" AND e.id = ?");
        bind_values.push(Value::Integer(employee_id));
    }

    if let Some(department) = filter.department.as_ref() {
        sql.push_str(" AND e.department = ?");
        bind_values.push(Value::Text(department.clone()));
    }

    if let Some(software_id) = filter.software_id {
        sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM software_access f
                WHERE f.employee_id = e.id
                  AND f.software_id = ?
            )",
        );
        bind_values.push(Value::Integer(software_id));
    }

    sql.push_str(" ORDER BY e.name COLLATE NOCASE ASC, e.id ASC, g.id ASC");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut roster: Vec<EmployeeWithAccess> = Vec::new();

    while let Some(row) = rows.next()? {
        let employee_id: EmployeeId = row.get("employee_id")?;
        let starts_new = roster
            .last()
            .map_or(true, |current| current.employee.id != employee_id);
        if starts_new {
            roster.push(EmployeeWithAccess {
                employee: parse_employee_row(row, employee_id)?,
                grants: Vec::new(),
            });
        }

        if let Some(grant) = parse_grant_columns(row, employee_id)? {
            if let Some(current) = roster.last_mut() {
                current.grants.push(grant);
            }
        }
    }

    Ok(roster)
}

/// Gets one employee with its grants.
pub fn get_employee_with_access(
    conn: &Connection,
    id: EmployeeId,
) -> RepoResult<Option<EmployeeWithAccess>> {
    let filter = RosterFilter {
        employee_id: Some(id),
        ..RosterFilter::default()
    };
    Ok(list_employees_with_access(conn, &filter)?.into_iter().next())
}

/// Lists distinct, non-blank departments.
pub fn list_departments(conn: &Connection) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT department
         FROM employees
         WHERE TRIM(department) <> ''
         ORDER BY department ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut departments: Vec<String> = Vec::new();
    while let Some(row) = rows.next()? {
        departments.push(row.get(0)?);
    }
    Ok(departments)
}

fn parse_employee_row(row: &Row<'_>, id: EmployeeId) -> RepoResult<Employee> {
    Ok(Employee {
        id,
        name: row.get("name")?,
        department: row.get("department")?,
        role: row.get("role")?,
        manager: row.get("manager")?,
    })
}

fn parse_grant_columns(row: &Row<'_>, employee_id: EmployeeId) -> RepoResult<Option<AccessGrant>> {
    let Some(software_id) = row.get::<_, Option<SoftwareId>>("software_id")? else {
        return Ok(None);
    };

    let level_text: String = row.get("access_level")?;
    let level = AccessLevel::parse(&level_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid access level `{level_text}` in software_access.access_level"
        ))
    })?;

    Ok(Some(AccessGrant {
        employee_id,
        software_id,
        level,
    }))
}
