//! # Export Pipeline Tests
//!
//! End-to-end batch runs: render rows, pack the archive, and read it back
//! with the `zip` crate.

use fieldpress::FieldpressError;
use fieldpress::binding::BindingTable;
use fieldpress::data::{Dataset, Row};
use fieldpress::export::{
    ExportJob, ExportOptions, ExportProgress, ExportReport, ZipArchiveWriter, run_export,
};
use fieldpress::field::Field;
use fieldpress::layout::Layout;
use fieldpress::naming::FileNamingPolicy;
use fieldpress::render::QrCodeGenerator;
use fieldpress::template::Template;
use fieldpress::text::FontBook;
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn white_template() -> Arc<Template> {
    Arc::new(Template::from_image(RgbaImage::from_pixel(100, 100, WHITE)))
}

fn dataset(column: &str, values: &[&str]) -> Arc<Dataset> {
    let rows = values.iter().map(|v| Row::new([(column, *v)])).collect();
    Arc::new(Dataset::new(vec![column.to_string()], rows))
}

/// One text field `greeting` bound to `name`.
fn greeting_job(data: Arc<Dataset>, naming: FileNamingPolicy) -> ExportJob {
    let fields = vec![Field::text("greeting", 10.0, 10.0).with_size(20)];
    let mut bindings = BindingTable::for_fields(&fields);
    bindings.bind("greeting", Some("name".to_string())).unwrap();
    ExportJob::new(
        white_template(),
        data,
        fields,
        bindings,
        naming,
        Arc::new(FontBook::builtin()),
    )
    .unwrap()
}

fn fast_options() -> ExportOptions {
    ExportOptions {
        row_yield: Duration::ZERO,
        ..ExportOptions::default()
    }
}

async fn export(job: &ExportJob, options: &ExportOptions) -> Result<ExportReport, FieldpressError> {
    run_export(
        job,
        &QrCodeGenerator::default(),
        Box::new(ZipArchiveWriter::new()),
        options,
    )
    .await
}

fn read_archive(bytes: &[u8]) -> Vec<(String, RgbaImage)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            let image = image::load_from_memory(&data).unwrap().to_rgba8();
            (file.name().to_string(), image)
        })
        .collect()
}

fn names(entries: &[(String, RgbaImage)]) -> Vec<&str> {
    entries.iter().map(|(n, _)| n.as_str()).collect()
}

fn has_ink(image: &RgbaImage) -> bool {
    image.pixels().any(|p| p.0[0] < 128)
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_one_image_per_row_with_default_names() {
    let job = greeting_job(dataset("name", &["Ann", ""]), FileNamingPolicy::default());
    let report = export(&job, &fast_options()).await.unwrap();

    assert_eq!(report.produced, 2);
    assert_eq!(report.total, 2);
    assert!(report.skipped.is_empty());
    assert!(report.archive_name.starts_with("generated_images_"));

    let entries = read_archive(&report.archive);
    assert_eq!(names(&entries), vec!["image_0001.png", "image_0002.png"]);

    let (_, first) = &entries[0];
    assert_eq!(first.dimensions(), (100, 100));
    assert!(has_ink(first));

    // Blank cell and blank demo value: the field is skipped entirely.
    let (_, second) = &entries[1];
    assert!(second.pixels().all(|p| *p == WHITE));
}

#[tokio::test]
async fn test_demo_value_used_when_cell_blank() {
    let fields = vec![Field::text("greeting", 10.0, 10.0).with_size(20).with_demo("Guest")];
    let mut bindings = BindingTable::for_fields(&fields);
    bindings.bind("greeting", Some("name".to_string())).unwrap();
    let job = ExportJob::new(
        white_template(),
        dataset("name", &["  "]),
        fields,
        bindings,
        FileNamingPolicy::default(),
        Arc::new(FontBook::builtin()),
    )
    .unwrap();

    let report = export(&job, &fast_options()).await.unwrap();
    let entries = read_archive(&report.archive);
    assert!(has_ink(&entries[0].1));
}

#[tokio::test]
async fn test_column_names_with_sequence_numbers() {
    let job = greeting_job(
        dataset("name", &["Jane Doe", "", "a/b:c"]),
        FileNamingPolicy::from_column("name", true),
    );
    let report = export(&job, &fast_options()).await.unwrap();
    let entries = read_archive(&report.archive);
    assert_eq!(
        names(&entries),
        vec!["0001_Jane Doe.png", "image_0002.png", "0003_a_b_c.png"]
    );
}

#[tokio::test]
async fn test_colliding_names_last_write_wins() {
    let job = greeting_job(
        dataset("name", &["Ann", "Bo", "Ann"]),
        FileNamingPolicy::from_column("name", false),
    );
    let report = export(&job, &fast_options()).await.unwrap();
    assert_eq!(report.produced, 3);

    let entries = read_archive(&report.archive);
    assert_eq!(names(&entries), vec!["Ann.png", "Bo.png"]);
}

#[tokio::test]
async fn test_unmapped_fields_reported_but_not_blocking() {
    let fields = vec![
        Field::text("greeting", 10.0, 10.0).with_size(20),
        Field::text("footer", 10.0, 60.0).with_demo("Welcome"),
    ];
    let mut bindings = BindingTable::for_fields(&fields);
    bindings.bind("greeting", Some("name".to_string())).unwrap();
    let job = ExportJob::new(
        white_template(),
        dataset("name", &["Ann"]),
        fields,
        bindings,
        FileNamingPolicy::default(),
        Arc::new(FontBook::builtin()),
    )
    .unwrap();

    let report = export(&job, &fast_options()).await.unwrap();
    assert_eq!(report.unmapped, vec!["footer".to_string()]);
    assert_eq!(report.produced, 1);
}

#[tokio::test]
async fn test_layout_bound_to_absent_column_still_exports() {
    let layout = Layout::from_json(
        r##"{
            "fields": [
                {"name": "greeting", "x": 10.0, "y": 10.0, "demo_value": "Guest",
                 "kind": "text", "font_size_px": 20, "font_family": "spleen",
                 "color": "#000000"}
            ],
            "bindings": {"greeting": "full_name"},
            "naming": {"source_column": "badge_id", "include_sequence_number": true}
        }"##,
    )
    .unwrap();
    let (fields, bindings, naming) = layout.into_parts().unwrap();
    let job = ExportJob::new(
        white_template(),
        dataset("name", &["Ann", "Bo"]),
        fields,
        bindings,
        naming,
        Arc::new(FontBook::builtin()),
    )
    .unwrap();
    assert_eq!(
        job.missing_columns(),
        vec!["full_name".to_string(), "badge_id".to_string()]
    );

    let report = export(&job, &fast_options()).await.unwrap();
    assert_eq!(report.produced, 2);
    assert!(report.skipped.is_empty());

    let entries = read_archive(&report.archive);
    assert_eq!(names(&entries), vec!["image_0001.png", "image_0002.png"]);
    // Both rows show the demo value, so the images are identical and inked.
    assert!(has_ink(&entries[0].1));
    assert_eq!(entries[0].1, entries[1].1);
}

#[tokio::test]
async fn test_qr_field_rendered_into_its_square() {
    let fields = vec![Field::qr("link", 20.0, 20.0).with_size(60)];
    let mut bindings = BindingTable::for_fields(&fields);
    bindings.bind("link", Some("url".to_string())).unwrap();
    let job = ExportJob::new(
        white_template(),
        dataset("url", &["https://example.com/a"]),
        fields,
        bindings,
        FileNamingPolicy::default(),
        Arc::new(FontBook::builtin()),
    )
    .unwrap();

    let report = export(&job, &fast_options()).await.unwrap();
    let (_, image) = &read_archive(&report.archive)[0];
    assert!(image.pixels().any(|p| p.0 == [0, 0, 0, 255]));
    assert_eq!(image.get_pixel(5, 5), &WHITE);
    assert_eq!(image.get_pixel(90, 90), &WHITE);
}

#[tokio::test]
async fn test_cancel_during_row_yield() {
    let job = greeting_job(dataset("name", &["Ann", "Bo", "Cy"]), FileNamingPolicy::default());
    let cancel = CancellationToken::new();
    let (tx, mut rx) = watch::channel(ExportProgress::default());
    let options = ExportOptions {
        row_yield: Duration::from_secs(30),
        ..ExportOptions::default()
    }
    .with_cancel(cancel.clone())
    .with_progress(tx);

    let canceller = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            if rx.borrow().current >= 1 {
                cancel.cancel();
                break;
            }
        }
    });

    let result = tokio::time::timeout(Duration::from_secs(10), export(&job, &options))
        .await
        .expect("cancellation should end the run promptly");
    assert!(matches!(result, Err(FieldpressError::Cancelled)));
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_archive_written_to_disk_reads_back() {
    let job = greeting_job(dataset("name", &["Ann"]), FileNamingPolicy::default());
    let report = export(&job, &fast_options()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(&report.archive_name);
    std::fs::write(&path, &report.archive).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 1);
}
