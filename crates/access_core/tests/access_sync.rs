use access_core::db::{open_db, open_db_in_memory};
use access_core::{
    AccessLevel, AccessRepository, AccessService, AccessServiceError, EmployeeDraft, EntityRef,
    GrantSpec, RepoError, SqliteAccessRepository, UniqueKey,
};
use rusqlite::Connection;
use std::sync::{Arc, Barrier};
use std::thread;

fn ana() -> EmployeeDraft {
    EmployeeDraft::new("Ana", "Finance", "Analyst").with_manager("Bruno")
}

fn grant_rows(conn: &Connection, employee_id: i64) -> Vec<(i64, String)> {
    let mut stmt = conn
        .prepare(
            "SELECT software_id, access_level
             FROM software_access
             WHERE employee_id = ?1
             ORDER BY id ASC;",
        )
        .unwrap();
    let rows = stmt
        .query_map([employee_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap();
    rows.collect::<Result<Vec<_>, _>>().unwrap()
}

#[test]
fn replace_overwrites_previous_grant_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));

    let slack = service.add_software("Slack").unwrap();
    let jira = service.add_software("Jira").unwrap();
    assert_eq!((slack.id, jira.id), (1, 2));

    let created = service
        .create_employee(&ana(), &[GrantSpec::new(slack.id, AccessLevel::Intermediate)])
        .unwrap();
    assert_eq!(created.grant_specs(), vec![GrantSpec::new(1, AccessLevel::Intermediate)]);

    let replaced = service
        .replace_employee(
            created.employee.id,
            &ana(),
            &[GrantSpec::new(jira.id, AccessLevel::Administrator)],
        )
        .unwrap();
    assert_eq!(
        replaced.grant_specs(),
        vec![GrantSpec::new(2, AccessLevel::Administrator)]
    );
    assert_eq!(replaced.level_for(slack.id), None);

    let reread = service.get_employee(created.employee.id).unwrap().unwrap();
    assert_eq!(reread, replaced);
}

#[test]
fn failed_replace_with_unknown_software_keeps_prior_state() {
    let mut conn = open_db_in_memory().unwrap();
    let employee_id = {
        let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
        service.add_software("Slack").unwrap();
        let jira = service.add_software("Jira").unwrap();
        let created = service
            .create_employee(&ana(), &[GrantSpec::new(jira.id, AccessLevel::Administrator)])
            .unwrap();

        let renamed = EmployeeDraft::new("Ana Souza", "Legal", "Counsel");
        let err = service
            .replace_employee(
                created.employee.id,
                &renamed,
                &[GrantSpec::new(99, AccessLevel::Basic)],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AccessServiceError::NotFound(EntityRef::Software(99))
        ));

        let after = service.get_employee(created.employee.id).unwrap().unwrap();
        assert_eq!(after.employee.name, "Ana");
        assert_eq!(after.employee.department, "Finance");
        assert_eq!(after.employee.manager.as_deref(), Some("Bruno"));
        assert_eq!(
            after.grant_specs(),
            vec![GrantSpec::new(jira.id, AccessLevel::Administrator)]
        );
        created.employee.id
    };

    assert_eq!(grant_rows(&conn, employee_id), vec![(2, "administrator".to_string())]);
}

#[test]
fn duplicate_software_in_target_set_fails_closed() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
    let slack = service.add_software("Slack").unwrap();
    let created = service
        .create_employee(&ana(), &[GrantSpec::new(slack.id, AccessLevel::Basic)])
        .unwrap();

    let err = service
        .replace_employee(
            created.employee.id,
            &ana(),
            &[
                GrantSpec::new(slack.id, AccessLevel::Intermediate),
                GrantSpec::new(slack.id, AccessLevel::Administrator),
            ],
        )
        .unwrap_err();
    match err {
        AccessServiceError::DuplicateKey(UniqueKey::Grant {
            employee_id,
            software_id,
        }) => {
            assert_eq!(employee_id, created.employee.id);
            assert_eq!(software_id, slack.id);
        }
        other => panic!("unexpected error: {other}"),
    }

    let after = service.get_employee(created.employee.id).unwrap().unwrap();
    assert_eq!(after.grant_specs(), vec![GrantSpec::new(slack.id, AccessLevel::Basic)]);
}

#[test]
fn create_with_unknown_software_leaves_no_employee_row() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
        let err = service
            .create_employee(&ana(), &[GrantSpec::new(7, AccessLevel::Basic)])
            .unwrap_err();
        assert!(matches!(
            err,
            AccessServiceError::NotFound(EntityRef::Software(7))
        ));
    }

    let employees: i64 = conn
        .query_row("SELECT COUNT(*) FROM employees;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(employees, 0);
}

#[test]
fn empty_target_set_clears_all_grants() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
    let slack = service.add_software("Slack").unwrap();
    let jira = service.add_software("Jira").unwrap();
    let created = service
        .create_employee(
            &ana(),
            &[
                GrantSpec::new(slack.id, AccessLevel::Basic),
                GrantSpec::new(jira.id, AccessLevel::Intermediate),
            ],
        )
        .unwrap();
    assert_eq!(created.grants.len(), 2);

    let cleared = service
        .replace_employee(created.employee.id, &ana(), &[])
        .unwrap();
    assert!(cleared.grants.is_empty());
}

#[test]
fn replace_unknown_employee_returns_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));

    let err = service.replace_employee(42, &ana(), &[]).unwrap_err();
    assert!(matches!(
        err,
        AccessServiceError::NotFound(EntityRef::Employee(42))
    ));
}

#[test]
fn replace_may_keep_own_name_with_different_case() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
    let created = service.create_employee(&ana(), &[]).unwrap();

    let renamed = EmployeeDraft::new("ANA", "Finance", "Lead Analyst");
    let updated = service
        .replace_employee(created.employee.id, &renamed, &[])
        .unwrap();
    assert_eq!(updated.employee.name, "ANA");
    assert_eq!(updated.employee.role, "Lead Analyst");
    assert_eq!(updated.employee.manager, None);
}

#[test]
fn renaming_onto_another_employee_is_rejected_before_write() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
    service.create_employee(&ana(), &[]).unwrap();
    let bruno = service
        .create_employee(&EmployeeDraft::new("Bruno", "IT", "Manager"), &[])
        .unwrap();

    let err = service
        .replace_employee(bruno.employee.id, &EmployeeDraft::new(" ana ", "IT", "Manager"), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        AccessServiceError::DuplicateKey(UniqueKey::EmployeeName(ref name)) if name == "ana"
    ));
}

#[test]
fn create_rejects_case_insensitive_duplicate_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
    service.create_employee(&ana(), &[]).unwrap();

    let err = service
        .create_employee(&EmployeeDraft::new("aNa", "Ops", "Intern"), &[])
        .unwrap_err();
    assert!(matches!(err, AccessServiceError::DuplicateKey(_)));
    assert_eq!(err.code(), "duplicate_key");
}

#[test]
fn create_rejects_blank_required_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));

    let err = service
        .create_employee(&EmployeeDraft::new("Ana", "Finance", "   "), &[])
        .unwrap_err();
    assert!(matches!(err, AccessServiceError::InvalidField(_)));
}

#[test]
fn storage_rejects_exact_duplicate_name_without_guard() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAccessRepository::new(&mut conn);
    repo.replace_employee_access(None, &ana(), &[]).unwrap();

    let err = repo.replace_employee_access(None, &ana(), &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey(UniqueKey::EmployeeName(ref name)) if name == "Ana"
    ));
}

#[test]
fn repository_rejects_case_variant_employee_names_without_guard() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAccessRepository::new(&mut conn);
    repo.replace_employee_access(None, &ana(), &[]).unwrap();
    let bruno = repo
        .replace_employee_access(None, &EmployeeDraft::new("Bruno", "IT", "Manager"), &[])
        .unwrap();

    let err = repo
        .replace_employee_access(None, &EmployeeDraft::new("ANA", "Ops", "Intern"), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateKey(UniqueKey::EmployeeName(ref name)) if name == "ANA"
    ));

    let err = repo
        .replace_employee_access(Some(bruno), &EmployeeDraft::new("ana", "IT", "Manager"), &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateKey(_)));
    let kept = repo.get_employee_with_access(bruno).unwrap().unwrap();
    assert_eq!(kept.employee.name, "Bruno");
}

#[test]
fn repository_rolls_back_scalar_update_when_grant_insert_fails() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAccessRepository::new(&mut conn);
    let slack = repo.create_software("Slack").unwrap();
    let id = repo
        .replace_employee_access(None, &ana(), &[GrantSpec::new(slack, AccessLevel::Basic)])
        .unwrap();

    let err = repo
        .replace_employee_access(
            Some(id),
            &EmployeeDraft::new("Ana Souza", "Finance", "Analyst"),
            &[
                GrantSpec::new(slack, AccessLevel::Administrator),
                GrantSpec::new(1234, AccessLevel::Basic),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityRef::Software(1234))));

    let after = repo.get_employee_with_access(id).unwrap().unwrap();
    assert_eq!(after.employee.name, "Ana");
    assert_eq!(after.grant_specs(), vec![GrantSpec::new(slack, AccessLevel::Basic)]);
}

#[test]
fn delete_employee_cascades_grants() {
    let mut conn = open_db_in_memory().unwrap();
    let employee_id = {
        let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
        let slack = service.add_software("Slack").unwrap();
        let jira = service.add_software("Jira").unwrap();
        let created = service
            .create_employee(
                &ana(),
                &[
                    GrantSpec::new(slack.id, AccessLevel::Basic),
                    GrantSpec::new(jira.id, AccessLevel::Administrator),
                ],
            )
            .unwrap();
        service.delete_employee(created.employee.id).unwrap();
        assert!(service.get_employee(created.employee.id).unwrap().is_none());

        let err = service.delete_employee(created.employee.id).unwrap_err();
        assert!(matches!(
            err,
            AccessServiceError::NotFound(EntityRef::Employee(_))
        ));
        created.employee.id
    };

    assert!(grant_rows(&conn, employee_id).is_empty());
    let orphans: i64 = conn
        .query_row(
            "SELECT COUNT(*)
             FROM software_access g
             LEFT JOIN employees e ON e.id = g.employee_id
             WHERE e.id IS NULL;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn concurrent_replaces_on_same_employee_never_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.db");

    let (employee_id, software_ids) = {
        let mut conn = open_db(&path).unwrap();
        let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
        let ids: Vec<i64> = (0..6)
            .map(|idx| service.add_software(&format!("tool-{idx}")).unwrap().id)
            .collect();
        let created = service.create_employee(&ana(), &[]).unwrap();
        (created.employee.id, ids)
    };

    let left: Vec<GrantSpec> = software_ids[..3]
        .iter()
        .map(|id| GrantSpec::new(*id, AccessLevel::Basic))
        .collect();
    let right: Vec<GrantSpec> = software_ids[3..]
        .iter()
        .map(|id| GrantSpec::new(*id, AccessLevel::Administrator))
        .collect();

    let handles: Vec<_> = [left.clone(), right.clone()]
        .into_iter()
        .map(|target| {
            let path = path.clone();
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                let mut repo = SqliteAccessRepository::new(&mut conn);
                for _ in 0..20 {
                    repo.replace_employee_access(Some(employee_id), &ana(), &target)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    let repo = SqliteAccessRepository::new(&mut conn);
    let stored = repo
        .get_employee_with_access(employee_id)
        .unwrap()
        .unwrap()
        .grant_specs();
    assert!(stored == left || stored == right, "interleaved grants: {stored:?}");
}

#[test]
fn concurrent_case_variant_adds_keep_one_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("access.db");
    drop(open_db(&path).unwrap());

    const ROUNDS: usize = 30;
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["Tool", "tool"]
        .into_iter()
        .map(|prefix| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = open_db(&path).unwrap();
                let mut service = AccessService::new(SqliteAccessRepository::new(&mut conn));
                let mut added = 0;
                for round in 0..ROUNDS {
                    barrier.wait();
                    match service.add_software(&format!("{prefix}{round}")) {
                        Ok(_) => added += 1,
                        Err(AccessServiceError::DuplicateKey(UniqueKey::SoftwareName(_))) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
                added
            })
        })
        .collect();
    let added: usize = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .sum();

    let mut conn = open_db(&path).unwrap();
    let repo = SqliteAccessRepository::new(&mut conn);
    assert_eq!(added, ROUNDS);
    assert_eq!(repo.list_software().unwrap().len(), ROUNDS);
}
