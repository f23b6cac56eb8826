//! Manifest parsing throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use mlops_agent::installer::{AppContext, ManifestParser};
use mlops_agent::ipc::{decode_message, encode_message, BusMessage, ModelCall, DEFAULT_MAX_MESSAGE_SIZE};
use mlops_agent::MemoryBackend;

fn manifest_with(entries: usize) -> String {
    let models: Vec<serde_json::Value> = (0..entries)
        .map(|i| {
            serde_json::json!({
                "name": format!("model-{}", i % 16),
                "model": format!("/opt/res/model-{}.tflite", i),
                "description": "benchmark model",
                "activate": if i % 4 == 0 { "true" } else { "false" },
            })
        })
        .collect();
    let resources: Vec<String> = (0..entries).map(|i| format!("/opt/res/data-{}.bin", i)).collect();
    serde_json::json!({
        "models": models,
        "resource": { "name": "data", "path": resources },
        "pipeline": { "name": "bench", "pipeline": "appsrc ! tensor_filter ! fakesink" },
    })
    .to_string()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_parse");
    let app_info = AppContext::new("org.example.bench", None, "mlmodels", "1.0")
        .to_app_info()
        .expect("app info");

    for entries in [1usize, 16, 256] {
        let manifest = manifest_with(entries);
        group.throughput(Throughput::Elements(entries as u64 * 2 + 1));
        group.bench_with_input(BenchmarkId::new("entries", entries), &manifest, |b, text| {
            b.iter(|| {
                let backend = MemoryBackend::new();
                ManifestParser::new(&backend)
                    .parse_str(black_box(text), &app_info)
                    .expect("valid manifest")
            })
        });
    }

    group.finish();
}

fn bench_message_codec(c: &mut Criterion) {
    let message = BusMessage::model(ModelCall::Register {
        name: "mobilenet".into(),
        path: "/opt/res/mobilenet_v2.tflite".into(),
        is_active: true,
        description: "image classification".into(),
        app_info: "{\"is_rpk\":\"T\"}".into(),
    });
    let bytes = encode_message(&message, DEFAULT_MAX_MESSAGE_SIZE).expect("encode");

    c.bench_function("encode_register", |b| {
        b.iter(|| encode_message(black_box(&message), DEFAULT_MAX_MESSAGE_SIZE))
    });
    c.bench_function("decode_register", |b| {
        b.iter(|| decode_message(black_box(&bytes), DEFAULT_MAX_MESSAGE_SIZE))
    });
}

criterion_group!(benches, bench_parse, bench_message_codec);
criterion_main!(benches);
