use scan_library::*;
use tempfile::NamedTempFile;

#[test]
fn test_default_options_valid() {
    let options = LibraryOptions::default();
    assert!(options.validate().is_ok());
    assert_eq!(options.base_name, "scannedDocument");
    assert_eq!(options.extension, "pdf");
}

#[test]
fn test_invalid_options_rejected() {
    let cases: Vec<Box<dyn Fn(&mut LibraryOptions)>> = vec![
        Box::new(|o: &mut LibraryOptions| o.base_name = "  ".to_string()),
        Box::new(|o: &mut LibraryOptions| o.base_name = "a/b".to_string()),
        Box::new(|o: &mut LibraryOptions| o.extension = "p.df".to_string()),
        Box::new(|o: &mut LibraryOptions| o.dpi = 0.0),
        Box::new(|o: &mut LibraryOptions| o.dpi = f32::NAN),
        Box::new(|o: &mut LibraryOptions| o.thumbnail_max_edge = 0),
    ];
    for mutate in cases {
        let mut options = LibraryOptions::default();
        mutate(&mut options);
        assert!(matches!(options.validate(), Err(LibraryError::Config(_))));
    }
}

#[test]
fn test_encode_options_follow_library_options() {
    let options = LibraryOptions {
        dpi: 300.0,
        document_title: Some("Scans".to_string()),
        ..Default::default()
    };
    let encode = options.encode_options();
    assert_eq!(encode.dpi, 300.0);
    assert_eq!(encode.title.as_deref(), Some("Scans"));
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_save_and_load_options() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let options = LibraryOptions {
        library_dir: "/tmp/scans".into(),
        base_name: "receipt".to_string(),
        dpi: 150.0,
        thumbnail_max_edge: 128,
        ..Default::default()
    };
    options.save(path).await.unwrap();
    let loaded = LibraryOptions::load(path).await.unwrap();
    assert_eq!(loaded, options);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), r#"{ "base_name": "invoice" }"#).unwrap();
    let loaded = LibraryOptions::load(temp_file.path()).await.unwrap();
    assert_eq!(loaded.base_name, "invoice");
    assert_eq!(loaded.extension, "pdf");
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_load_rejects_invalid_config() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), r#"{ "dpi": -5.0 }"#).unwrap();
    let result = LibraryOptions::load(temp_file.path()).await;
    assert!(matches!(result, Err(LibraryError::Config(_))));
}
