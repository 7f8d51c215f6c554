//! Benchmarks for the markup rewrite pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use access_aide::markup::reserialize;
use access_aide::nav::index_navigation;
use access_aide::transform::{DocumentContext, patch_alt_text, transform_document};

const SECTIONS: usize = 200;

/// A long chapter with footnotes, tables and images in every section.
fn sample_chapter() -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\" \
         xmlns:epub=\"http://www.idpf.org/2007/ops\">\n<head><title></title></head>\n<body>\n",
    );
    for i in 0..SECTIONS {
        doc.push_str(&format!(
            "<section id=\"s{i}\" epub:type=\"chapter\">\n<h2>Section {i}</h2>\n\
             <p>Lorem ipsum dolor sit amet, <a href=\"#n{i}\" epub:type=\"noteref\">{i}</a> \
             consectetur adipiscing elit &amp; sed do eiusmod.</p>\n\
             <img src=\"../Images/fig{i}.png\"/>\n\
             <table><tr><td epub:type=\"table-cell\">x</td></tr></table>\n\
             <aside id=\"n{i}\" epub:type=\"footnote\">Note {i}</aside>\n</section>\n"
        ));
    }
    doc.push_str("</body>\n</html>\n");
    doc
}

fn sample_nav() -> String {
    let mut nav = String::from("<html><body><nav epub:type=\"toc\"><ol>\n");
    for i in 0..SECTIONS {
        nav.push_str(&format!(
            "<li><a href=\"Text/c{i}.xhtml\">Chapter {i}</a></li>\n"
        ));
    }
    nav.push_str("</ol></nav></body></html>");
    nav
}

fn ctx() -> DocumentContext<'static> {
    DocumentContext {
        manifest_id: "c1",
        bookpath: "OEBPS/Text/c1.xhtml",
        language: "en",
        is_epub3: true,
        derive_roles: true,
    }
}

// ============================================================================
// Markup Benchmarks
// ============================================================================

fn bench_reserialize(c: &mut Criterion) {
    let doc = sample_chapter();

    c.bench_function("reserialize", |b| {
        b.iter(|| reserialize(&doc));
    });
}

fn bench_index_navigation(c: &mut Criterion) {
    let nav = sample_nav();

    c.bench_function("index_navigation", |b| {
        b.iter(|| index_navigation(&nav, "OEBPS/nav.xhtml", true));
    });
}

// ============================================================================
// Transform Benchmarks
// ============================================================================

fn bench_transform_document(c: &mut Criterion) {
    let doc = sample_chapter();
    let nav = index_navigation(&sample_nav(), "OEBPS/nav.xhtml", true);

    c.bench_function("transform_document", |b| {
        b.iter(|| transform_document(&doc, &ctx(), &nav));
    });
}

fn bench_patch_alt_text(c: &mut Criterion) {
    let doc = sample_chapter();

    c.bench_function("patch_alt_text", |b| {
        b.iter(|| patch_alt_text(&doc, SECTIONS / 2, "A figure & its caption"));
    });
}

criterion_group!(
    benches,
    // Markup
    bench_reserialize,
    bench_index_navigation,
    // Transform
    bench_transform_document,
    bench_patch_alt_text,
);
criterion_main!(benches);
