//! Software row persistence.
//!
//! # Invariants
//! - Names are unique ignoring ASCII case; the check runs inside the write
//!   transaction and the column constraint backs it up.
//! - A referenced software row is never deleted; grants are not cascaded.

use super::error::{
    on_unique, violated_constraint, Constraint, EntityRef, RepoError, RepoResult, UniqueKey,
};
use crate::model::software::SoftwareId;
use rusqlite::{params, Transaction};

pub(super) fn insert_software(tx: &Transaction<'_>, name: &str) -> RepoResult<SoftwareId> {
    ensure_name_free(tx, name, None)?;
    tx.execute("INSERT INTO software (name) VALUES (?1);", [name])
        .map_err(|err| on_unique(err, || UniqueKey::SoftwareName(name.to_string())))?;
    Ok(tx.last_insert_rowid())
}

pub(super) fn rename_software(tx: &Transaction<'_>, id: SoftwareId, name: &str) -> RepoResult<()> {
    ensure_name_free(tx, name, Some(id))?;
    let changed = tx
        .execute(
            "UPDATE software SET name = ?2 WHERE id = ?1;",
            params![id, name],
        )
        .map_err(|err| on_unique(err, || UniqueKey::SoftwareName(name.to_string())))?;

    if changed == 0 {
        return Err(RepoError::NotFound(EntityRef::Software(id)));
    }
    Ok(())
}

/// Deletes one software row after checking it exists and is unreferenced.
///
/// The foreign key on `software_access.software_id` rejects the delete even
/// if the reference count read here were stale.
pub(super) fn delete_software(tx: &Transaction<'_>, id: SoftwareId) -> RepoResult<()> {
    if !software_exists(tx, id)? {
        return Err(RepoError::NotFound(EntityRef::Software(id)));
    }

    let grant_count = count_references(tx, id)?;
    if grant_count > 0 {
        return Err(RepoError::ReferentialConflict {
            software_id: id,
            grant_count,
        });
    }

    match tx.execute("DELETE FROM software WHERE id = ?1;", [id]) {
        Ok(_) => Ok(()),
        Err(err) if violated_constraint(&err) == Some(Constraint::ForeignKey) => {
            Err(RepoError::ReferentialConflict {
                software_id: id,
                grant_count: count_references(tx, id)?,
            })
        }
        Err(err) => Err(err.into()),
    }
}

fn ensure_name_free(
    tx: &Transaction<'_>,
    name: &str,
    exclude_id: Option<SoftwareId>,
) -> RepoResult<()> {
    let taken: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM software
            WHERE name = ?1 COLLATE NOCASE AND id IS NOT ?2
        );",
        params![name, exclude_id],
        |row| row.get(0),
    )?;
    if taken == 1 {
        return Err(RepoError::DuplicateKey(UniqueKey::SoftwareName(
            name.to_string(),
        )));
    }
    Ok(())
}

fn software_exists(tx: &Transaction<'_>, id: SoftwareId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM software WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn count_references(tx: &Transaction<'_>, id: SoftwareId) -> RepoResult<u64> {
    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM software_access WHERE software_id = ?1;",
        [id],
        |row| row.get(0),
    )?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative reference count `{count}`")))
}
