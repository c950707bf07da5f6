use super::*;

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts")
}

#[test]
fn explicit_files_load() {
    let dir = fixture_dir();
    let set = FontSet::from_files(&dir.join("DejaVuSans.ttf"), &dir.join("DejaVuSans-Bold.ttf"))
        .unwrap();
    assert!(!set.face(TextWeight::Medium).bytes.is_empty());
    assert_ne!(
        set.face(TextWeight::Medium).bytes,
        set.face(TextWeight::Bold).bytes
    );
}

#[test]
fn missing_file_is_an_error() {
    let err = FontFace::from_path(&fixture_dir().join("nope.ttf")).unwrap_err();
    assert!(err.to_string().contains("nope.ttf"));
}

#[test]
fn discovery_finds_faces_in_extra_dir() {
    let set = FontSet::discover(&[fixture_dir()]).unwrap();
    assert!(!set.face(TextWeight::Medium).bytes.is_empty());
    assert!(!set.face(TextWeight::Bold).bytes.is_empty());
}
