use voicememo_core::db::open_db_in_memory;
use voicememo_core::{
    Note, NoteRepository, Project, ProjectRepository, ProjectService, RepoError, ServiceError,
    SqliteNoteRepository, SqliteProjectRepository, FALLBACK_PROJECT_ID, FALLBACK_PROJECT_NAME,
};

#[test]
fn fallback_project_is_seeded_and_active() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let fallback = repo.fallback_project().unwrap();
    assert_eq!(fallback.id, FALLBACK_PROJECT_ID);
    assert_eq!(fallback.name, FALLBACK_PROJECT_NAME);
    assert!(fallback.is_active);
    assert!(fallback.is_fallback());
}

#[test]
fn active_names_are_unique_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    repo.create_project(&Project::new("Work")).unwrap();
    let err = repo.create_project(&Project::new("  work ")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateProjectName(_)));

    let found = repo.find_active_by_name("WORK").unwrap().unwrap();
    assert_eq!(found.name, "Work");
}

#[test]
fn deleted_project_name_can_be_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let first = Project::new("Garden");
    repo.create_project(&first).unwrap();
    repo.soft_delete_project(first.id).unwrap();

    let second = Project::new("garden");
    repo.create_project(&second).unwrap();
    assert_eq!(
        repo.find_active_by_name("Garden").unwrap().unwrap().id,
        second.id
    );
    assert!(!repo.get_project(first.id).unwrap().unwrap().is_active);
}

#[test]
fn delete_moves_notes_to_fallback_project() {
    let conn = open_db_in_memory().unwrap();
    let projects = SqliteProjectRepository::try_new(&conn).unwrap();
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();

    let home = Project::new("Home");
    projects.create_project(&home).unwrap();
    let first = Note::new("fix the gutter", 1_000).with_project(home.id);
    let second = Note::new("buy paint", 2_000).with_project(home.id);
    let other = Note::new("unrelated", 3_000);
    for note in [&first, &second, &other] {
        notes.create_note(note).unwrap();
    }

    assert_eq!(projects.soft_delete_project(home.id).unwrap(), 2);
    assert_eq!(
        notes.get_note(first.id).unwrap().unwrap().project_id,
        Some(FALLBACK_PROJECT_ID)
    );
    assert_eq!(
        notes.get_note(second.id).unwrap().unwrap().project_id,
        Some(FALLBACK_PROJECT_ID)
    );
    assert_eq!(notes.get_note(other.id).unwrap().unwrap().project_id, None);

    let names = projects
        .list_active_projects()
        .unwrap()
        .into_iter()
        .map(|project| project.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec![FALLBACK_PROJECT_NAME.to_string()]);
}

#[test]
fn fallback_project_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let err = repo.soft_delete_project(FALLBACK_PROJECT_ID).unwrap_err();
    assert!(matches!(err, RepoError::FallbackProjectProtected));
}

#[test]
fn deleting_twice_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let project = Project::new("Travel");
    repo.create_project(&project).unwrap();

    repo.soft_delete_project(project.id).unwrap();
    let err = repo.soft_delete_project(project.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "project", .. }));
}

#[test]
fn service_trims_input_and_lists_names() {
    let conn = open_db_in_memory().unwrap();
    let service = ProjectService::new(SqliteProjectRepository::try_new(&conn).unwrap());

    let project = service
        .create_project("  Side Project ", Some("  "), Some("#10b981"))
        .unwrap();
    assert_eq!(project.name, "Side Project");
    assert_eq!(project.description, None);
    assert_eq!(project.color, "#10b981");

    let names = service.active_project_names().unwrap();
    assert_eq!(
        names,
        vec![FALLBACK_PROJECT_NAME.to_string(), "Side Project".to_string()]
    );

    assert!(matches!(
        service.create_project("   ", None, None),
        Err(ServiceError::EmptyInput(_))
    ));
}
