//! Command-line behaviour over small generated documents.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

/// Page `i` is `100 + i` points wide and shows "Page i".
fn numbered_pdf(pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|i| {
            let content = format!("BT /F1 12 Tf 20 20 Td (Page {}) Tj ET", i);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (100 + i as i64).into(), 200.into()],
                "Contents" => content_id,
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn pdf(&self, name: &str, pages: u32) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, numbered_pdf(pages)).unwrap();
        path
    }

    /// The binary, run inside the workspace with its own config home.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pagemark").unwrap();
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.path("config"));
        cmd
    }
}

fn page_widths(path: &Path) -> Vec<f64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            match &media_box[2] {
                Object::Integer(i) => *i as f64,
                Object::Real(r) => *r as f64,
                other => panic!("unexpected MediaBox entry {:?}", other),
            }
        })
        .collect()
}

#[test]
fn info_reports_pages_as_json() {
    let ws = Workspace::new();
    let input = ws.pdf("report.pdf", 3);

    ws.cmd()
        .args(["info", "--json"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page_count\": 3"))
        .stdout(predicate::str::contains("\"file_name\": \"report.pdf\""));
}

#[test]
fn missing_input_fails() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["info", "nope.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn split_writes_page_range() {
    let ws = Workspace::new();
    let input = ws.pdf("book.pdf", 10);

    ws.cmd()
        .arg("split")
        .arg(&input)
        .args(["-s", "3", "-e", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("book.split.pdf"));

    assert_eq!(page_widths(&ws.path("book.split.pdf")), vec![103.0, 104.0, 105.0, 106.0, 107.0]);
}

#[test]
fn split_with_reversed_range_writes_nothing() {
    let ws = Workspace::new();
    let input = ws.pdf("book.pdf", 10);

    ws.cmd()
        .arg("split")
        .arg(&input)
        .args(["-s", "7", "-e", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing written"));

    assert!(!ws.path("book.split.pdf").exists());
}

#[test]
fn merge_appends_globbed_files_in_order() {
    let ws = Workspace::new();
    let first = ws.pdf("a.pdf", 2);
    ws.pdf("part-1.pdf", 1);
    ws.pdf("part-2.pdf", 3);
    let pattern = ws.path("part-*.pdf");
    let output = ws.path("out.pdf");

    ws.cmd()
        .arg("merge")
        .arg(&first)
        .arg("--with")
        .arg(pattern.to_str().unwrap())
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(page_widths(&output), vec![101.0, 102.0, 101.0, 101.0, 102.0, 103.0]);
}

#[test]
fn merge_without_matches_fails() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["merge", "--with", "missing-*.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files match"));
}

#[test]
fn watermark_into_directory() {
    let ws = Workspace::new();
    let input = ws.pdf("memo.pdf", 2);
    let out_dir = ws.path("out");
    fs::create_dir(&out_dir).unwrap();

    ws.cmd()
        .arg("watermark")
        .arg(&input)
        .args(["-t", "DRAFT", "-n", "-o"])
        .arg(&out_dir)
        .assert()
        .success();

    let doc = Document::load(out_dir.join("memo.watermarked.pdf")).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn watermark_without_text_or_numbers_is_a_noop() {
    let ws = Workspace::new();
    let input = ws.pdf("memo.pdf", 2);

    ws.cmd()
        .arg("watermark")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing written"));
}

#[test]
fn export_text() {
    let ws = Workspace::new();
    let input = ws.pdf("notes.pdf", 2);

    ws.cmd()
        .arg("export")
        .arg(&input)
        .args(["-f", "txt"])
        .assert()
        .success();

    let text = fs::read_to_string(ws.path("notes.txt")).unwrap();
    assert!(text.contains("Page 1"));
    assert!(text.contains("Page 2"));
}

#[test]
fn export_pdf_replays_annotations() {
    let ws = Workspace::new();
    let input = ws.pdf("form.pdf", 2);
    let script = ws.path("ink.json");
    fs::write(
        &script,
        r##"[{"page": 2, "tool": "draw", "color": "#0000ff", "width": 4,
             "points": [[10, 10], [60, 90], [80, 120]]}]"##,
    )
    .unwrap();

    ws.cmd()
        .arg("export")
        .arg(&input)
        .args(["-f", "pdf", "-a"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("form.edited.pdf"));

    let doc = Document::load(ws.path("form.edited.pdf")).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn export_pdf_without_ink_stamps_blank_layer() {
    let ws = Workspace::new();
    let input = ws.pdf("form.pdf", 1);

    ws.cmd()
        .arg("export")
        .arg(&input)
        .args(["-f", "pdf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("form.edited.pdf"));

    let doc = Document::load(ws.path("form.edited.pdf")).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let (resources, _) = doc.get_page_resources(page_id).unwrap();
    let xobjects = resources.unwrap().get(b"XObject").unwrap().as_dict().unwrap();
    assert_eq!(xobjects.iter().filter(|(name, _)| name.starts_with(b"PmInk")).count(), 1);
}

#[test]
fn tables_to_csv_files() {
    let ws = Workspace::new();
    let input = ws.pdf("sheet.pdf", 3);
    let out_dir = ws.path("csv");

    ws.cmd()
        .arg("tables")
        .arg(&input)
        .args(["-p", "2", "-o"])
        .arg(&out_dir)
        .assert()
        .success();

    let csv = fs::read_to_string(out_dir.join("sheet-p2.csv")).unwrap();
    assert!(csv.contains("Page"));
    assert!(!out_dir.join("sheet-p1.csv").exists());
}

#[test]
fn config_init_then_get() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"));

    ws.cmd().args(["config", "init"]).assert().success();
    ws.cmd()
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    ws.cmd()
        .args(["config", "set", "compress.jpeg_quality", "55"])
        .assert()
        .success();
    ws.cmd()
        .args(["config", "get", "compress.jpeg_quality"])
        .assert()
        .success()
        .stdout(predicate::str::contains("55"));
}

#[test]
fn explicit_config_file_is_used() {
    let ws = Workspace::new();
    let input = ws.pdf("book.pdf", 2);
    let config = ws.path("custom.json");
    fs::write(&config, r#"{"compress": {"jpeg_quality": 10}}"#).unwrap();

    ws.cmd()
        .arg("-c")
        .arg(&config)
        .arg("info")
        .arg(&input)
        .assert()
        .success();

    fs::write(&config, "not json").unwrap();
    ws.cmd()
        .arg("-c")
        .arg(&config)
        .arg("info")
        .arg(&input)
        .assert()
        .failure();
}
