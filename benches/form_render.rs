use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use themis::adapters::translator::IdentityTranslator;
use themis::domain::PermissionContext;
use themis::forms::google_oauth2;
use themis::interpreter::FormInstance;

fn loaded_form() -> FormInstance {
    let schema = Arc::new(google_oauth2::schema());
    let mut form = FormInstance::new(schema, PermissionContext::administrator());
    let request = form.begin_load().unwrap();
    let defaults = google_oauth2::defaults();
    let current: HashMap<_, _> = request
        .current_keys
        .iter()
        .map(|k| (k.clone(), defaults[k].clone()))
        .collect();
    form.complete_load(Ok(current), Ok(defaults));
    form
}

fn benchmark_render(c: &mut Criterion) {
    let form = loaded_form();
    let translator = IdentityTranslator;

    c.bench_function("render_google_oauth2", |b| {
        b.iter(|| black_box(form.render(&translator)));
    });
}

fn benchmark_dirty_tracking(c: &mut Criterion) {
    let mut form = loaded_form();

    c.bench_function("edit_and_check_save", |b| {
        b.iter(|| {
            form.edit(google_oauth2::KEY, json!("client-id")).unwrap();
            let dirty = form.can_save();
            form.edit(google_oauth2::KEY, json!("")).unwrap();
            black_box(dirty && !form.can_save())
        });
    });
}

fn benchmark_code_editor_input(c: &mut Criterion) {
    let mut form = loaded_form();
    let text = "Default:\n  users: true\nEngineering:\n  admins:\n    - alice@example.com\n  users: true\n";

    c.bench_function("organization_map_input", |b| {
        b.iter(|| form.input(google_oauth2::ORGANIZATION_MAP, black_box(text)).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_render,
    benchmark_dirty_tracking,
    benchmark_code_editor_input
);
criterion_main!(benches);
