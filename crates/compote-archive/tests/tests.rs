#![cfg(all(feature = "tar", feature = "zip"))]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use compote_archive::{
    ArchiveExtractor, ArchiveFormat, ArtifactExtractor, Error, ExtractOptions, TarCompress,
};
use flate2::Compression;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;

fn write_tgz(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create tgz");
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("append tar entry");
    }

    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);

    for (name, content) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(content).expect("write zip entry");
    }

    writer.finish().expect("finish zip");
}

fn scratch() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::Builder::new()
        .prefix("compote-test-archive-")
        .tempdir()
        .expect("Failed to create temp dir");
    let out = dir.path().join("out");
    (dir, out)
}

#[test]
fn extract_tgz() {
    let (dir, out) = scratch();
    let source = dir.path().join("foo~1.2.3~abc.tgz");
    write_tgz(
        &source,
        &[
            ("idf_component.yml", b"version: 1.2.3\n"),
            ("src/foo.c", b"int foo(void) { return 1; }\n"),
        ],
    );

    let report = ArchiveExtractor::default().unpack(&source, &out).unwrap();

    assert_eq!(report.format, ArchiveFormat::Tar(TarCompress::Gzip));
    assert_eq!(report.entry_count, 2);
    assert_eq!(
        std::fs::read_to_string(out.join("src/foo.c")).unwrap(),
        "int foo(void) { return 1; }\n"
    );
    assert!(out.join("idf_component.yml").is_file());
}

#[test]
fn extract_tar_gz_with_strip_components() {
    let (dir, out) = scratch();
    let source = dir.path().join("bundle.tar.gz");
    write_tgz(&source, &[("foo-1.0/include/foo.h", b"#pragma once\n")]);

    let extractor = ArchiveExtractor::new(ExtractOptions::default().strip_components(1));
    extractor.unpack(&source, &out).unwrap();

    assert!(out.join("include/foo.h").is_file());
    assert!(!out.join("foo-1.0").exists());
}

#[test]
fn extract_zip() {
    let (dir, out) = scratch();
    let source = dir.path().join("foo.zip");
    write_zip(
        &source,
        &[("CMakeLists.txt", b"idf_component_register()\n"), ("docs/README.md", b"# foo\n")],
    );

    let report = ArchiveExtractor::default().unpack(&source, &out).unwrap();

    assert_eq!(report.format, ArchiveFormat::Zip);
    assert_eq!(report.entry_count, 2);
    assert_eq!(report.total_bytes, 31);
    assert!(out.join("docs/README.md").is_file());
}

#[test]
fn zip_slip_entry_is_rejected() {
    let (dir, out) = scratch();
    let source = dir.path().join("evil.zip");
    write_zip(&source, &[("../escaped.txt", b"gotcha")]);

    let result = ArchiveExtractor::default().unpack(&source, &out);

    assert!(matches!(result, Err(Error::ZipSlip { .. })));
    assert!(!dir.path().join("escaped.txt").exists());
}

#[test]
fn format_follows_filename_not_content() {
    let (dir, out) = scratch();
    let source = dir.path().join("mislabelled.zip");
    write_tgz(&source, &[("a.txt", b"a")]);

    let result = ArchiveExtractor::default().unpack(&source, &out);
    assert!(matches!(result, Err(Error::Corrupted(_))));
}

#[cfg(unix)]
fn write_tgz_with_links(path: &Path, links: &[(&str, &str)], files: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create tgz");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for (name, target) in links {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, name, target)
            .expect("append tar link");
    }
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *content)
            .expect("append tar entry");
    }

    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

#[cfg(unix)]
#[test]
fn chained_symlinks_cannot_escape_destination() {
    let (dir, out) = scratch();
    let source = dir.path().join("chained.tgz");
    write_tgz_with_links(
        &source,
        &[("a", "."), ("b", "a/..")],
        &[("b/evil.txt", b"gotcha")],
    );

    let result = ArchiveExtractor::default().unpack(&source, &out);

    assert!(matches!(result, Err(Error::SymlinkEscape { .. })));
    assert!(!dir.path().join("evil.txt").exists());
}

#[cfg(unix)]
#[test]
fn file_below_extracted_symlink_is_rejected() {
    let (dir, out) = scratch();
    let source = dir.path().join("through-link.tgz");
    write_tgz_with_links(
        &source,
        &[("inc", "include")],
        &[("inc/foo.h", b"#pragma once\n")],
    );

    let result = ArchiveExtractor::default().unpack(&source, &out);

    assert!(matches!(result, Err(Error::SymlinkTraversal { .. })));
    assert!(!out.join("include/foo.h").exists());
}

#[cfg(unix)]
#[test]
fn symlink_to_sibling_directory_is_kept() {
    let (dir, out) = scratch();
    let source = dir.path().join("inner-link.tgz");
    write_tgz_with_links(
        &source,
        &[("include/current", "../src")],
        &[("src/foo.c", b"int foo;\n")],
    );

    let report = ArchiveExtractor::default().unpack(&source, &out).unwrap();

    assert_eq!(report.entry_count, 2);
    let link = std::fs::read_link(out.join("include/current")).unwrap();
    assert_eq!(link, PathBuf::from("../src"));
}

#[cfg(unix)]
#[test]
fn zip_symlink_entry_becomes_symlink() {
    let (dir, out) = scratch();
    let source = dir.path().join("links.zip");
    {
        let file = File::create(&source).expect("create zip");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("CMakeLists.txt", SimpleFileOptions::default())
            .expect("start zip entry");
        writer
            .write_all(b"idf_component_register()\n")
            .expect("write zip entry");
        writer
            .add_symlink("build.cmake", "CMakeLists.txt", SimpleFileOptions::default())
            .expect("add zip symlink");
        writer.finish().expect("finish zip");
    }

    let report = ArchiveExtractor::default().unpack(&source, &out).unwrap();

    assert_eq!(report.entry_count, 2);
    let link = out.join("build.cmake");
    assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), PathBuf::from("CMakeLists.txt"));
}
