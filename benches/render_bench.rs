use criterion::{black_box, Criterion};
use pagesmith::{Component, Composer, Mode, PagePayload};

// A page with every builtin type repeated, in reverse position order so the sort does work.
fn large_payload(copies: usize) -> PagePayload {
    let raw = std::fs::read_to_string("tests/fixtures/landing.json").expect("read fixture");
    let mut payload = PagePayload::from_json(&raw).expect("parse fixture");
    let kinds = ["header", "hero", "text", "image", "button", "footer"];
    let mut components = Vec::new();
    for i in 0..copies {
        for (k, kind) in kinds.iter().enumerate() {
            let id = (i * kinds.len() + k) as i64 + 100;
            components.push(Component::new(id, kind, -id));
        }
    }
    payload.components = components;
    payload
}

fn bench_render_modes(c: &mut Criterion) {
    let composer = Composer::default();
    let payload = large_payload(20);

    c.bench_function("render_page_static", |b| {
        b.iter(|| {
            let doc = composer.render_page(&payload.page, black_box(&payload.components), Mode::Static);
            black_box(doc.to_html())
        })
    });

    c.bench_function("render_page_interactive", |b| {
        b.iter(|| {
            let doc =
                composer.render_page(&payload.page, black_box(&payload.components), Mode::Interactive);
            black_box(doc.to_html())
        })
    });
}

fn bench_export(c: &mut Criterion) {
    let composer = Composer::default();
    let payload = large_payload(5);

    c.bench_function("export_static_page", |b| {
        b.iter(|| {
            composer
                .export_static_page(&payload.page, black_box(&payload.components))
                .expect("export failed")
        })
    });
}

fn main() {
    let mut c = Criterion::default().configure_from_args();

    bench_render_modes(&mut c);
    bench_export(&mut c);

    c.final_summary();
}
