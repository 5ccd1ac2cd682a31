use std::fs;

use gpui_step_details::{
    ExistenceError, FileExistence, FileLookupKey, FileValidity, FsExistence,
};

fn project_root() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let project = root.path().join("project-1");
    fs::create_dir_all(project.join("notebooks")).unwrap();
    fs::create_dir_all(project.join("flows/etl")).unwrap();
    fs::write(project.join("main.orchest"), "{}").unwrap();
    fs::write(project.join("load.py"), "print('hi')\n").unwrap();
    fs::write(project.join("notebooks/train.ipynb"), "{}").unwrap();
    fs::write(project.join("flows/etl/etl.orchest"), "{}").unwrap();
    fs::write(project.join("flows/etl/extract.py"), "").unwrap();
    root
}

fn checker(root: &tempfile::TempDir) -> FsExistence {
    FsExistence::new(root.path())
        .pipeline("project-1", "main", "main.orchest")
        .pipeline("project-1", "etl", "flows/etl/etl.orchest")
}

#[test]
fn fs_lookup_finds_files_next_to_the_pipeline() {
    let root = project_root();
    let checker = checker(&root);

    let key = |path: &str| FileLookupKey::new("project-1", "main", path);
    assert!(checker.exists(&key("load.py")).unwrap());
    assert!(checker.exists(&key("/notebooks/train.ipynb")).unwrap());
    assert!(!checker.exists(&key("missing.py")).unwrap());
    // Directories are not step files.
    assert!(!checker.exists(&key("notebooks")).unwrap());
}

#[test]
fn same_path_resolves_per_pipeline_directory() {
    let root = project_root();
    let checker = checker(&root);

    let main = |path: &str| FileLookupKey::new("project-1", "main", path);
    let etl = |path: &str| FileLookupKey::new("project-1", "etl", path);

    assert!(checker.exists(&etl("extract.py")).unwrap());
    assert!(!checker.exists(&main("extract.py")).unwrap());
    assert!(checker.exists(&main("load.py")).unwrap());
    assert!(!checker.exists(&etl("load.py")).unwrap());
    assert!(checker.exists(&etl("../../load.py")).unwrap());
}

#[test]
fn unknown_project_or_pipeline_is_an_error() {
    let root = project_root();
    let checker = checker(&root);

    let err = checker
        .exists(&FileLookupKey::new("nope", "main", "load.py"))
        .unwrap_err();
    assert!(matches!(err, ExistenceError::UnknownProject(ref id) if id == "nope"));

    let err = checker
        .exists(&FileLookupKey::new("project-1", "ghost", "load.py"))
        .unwrap_err();
    assert!(matches!(
        err,
        ExistenceError::UnknownPipeline { ref pipeline_uuid, .. } if pipeline_uuid == "ghost"
    ));
}

#[test]
fn validity_follows_the_key() {
    let root = project_root();
    let checker = checker(&root);
    let mut validity = FileValidity::new();

    assert!(validity.check_now(FileLookupKey::new("project-1", "main", "load.py"), &checker));
    assert!(!validity.check_now(FileLookupKey::new("project-1", "main", "gone.py"), &checker));
    assert!(validity.check_now(FileLookupKey::new("project-1", "etl", "extract.py"), &checker));
    // Rule-based rejection never reaches the filesystem.
    assert!(!validity.check_now(FileLookupKey::new("project-1", "main", "load.txt"), &checker));
    assert!(!validity.check_now(FileLookupKey::new("nope", "main", "load.py"), &checker));
    assert!(!validity.is_pending());
}
