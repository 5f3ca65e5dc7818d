use behave_conformance::{build_all, BuildConfig, CaseRegistry};
use behave_graph_core::{FlowRuntime, Registry};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_build(c: &mut Criterion) {
    let registry = Registry::standard();
    let config = BuildConfig::default();
    c.bench_function("build_catalog", |b| {
        b.iter(|| {
            let mut cases = CaseRegistry::standard();
            let built = build_all(&registry, &mut cases, &config).expect("catalog builds");
            black_box(built.len())
        })
    });
}

fn bench_run(c: &mut Criterion) {
    let registry = Registry::standard();
    let mut cases = CaseRegistry::standard();
    let built = build_all(&registry, &mut cases, &BuildConfig::default()).expect("catalog builds");
    c.bench_function("run_catalog", |b| {
        b.iter(|| {
            for case in &built {
                let mut rt = FlowRuntime::new(&case.graph);
                for (event, delay) in case.report.entry_events.iter().zip(&case.report.entry_delays) {
                    rt.trigger_event(event).expect("entry event");
                    if let Some(delay) = delay {
                        rt.advance(*delay).expect("settle");
                    }
                }
                black_box(rt.logs().len());
            }
        })
    });
}

criterion_group!(benches, bench_build, bench_run);
criterion_main!(benches);
