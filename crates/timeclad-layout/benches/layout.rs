use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use timeclad_core::{Cladogram, Date, Node};
use timeclad_layout::{LayoutOptions, layout};

fn build_forest(count: usize) -> Cladogram {
    let mut clad = Cladogram::new();
    let mut starts = Vec::with_capacity(count);
    for i in 0..count {
        // Every fifth node starts a new tree; the others hang off a recent node.
        let (parent, start) = if i % 5 == 0 {
            (None, 1950 + (i % 40) as i32)
        } else {
            let p = i - 1 - (i % 3).min(i - 1);
            (Some(p), starts[p] + 1 + (i % 4) as i32)
        };
        starts.push(start);
        let stop = if i % 4 == 0 {
            Date::default()
        } else {
            Date::year(start + 3 + (i % 17) as i32)
        };
        let mut node = Node::new(format!("n{i}")).with_span(Date::year(start), stop);
        if let Some(p) = parent {
            node = node.with_parent(format!("n{p}"));
        }
        clad.nodes.push(node);
    }
    clad
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for count in [50usize, 200, 500] {
        let clad = build_forest(count);
        for (label, optimise) in [("plain", (0, 0)), ("full", (9, 9)), ("parent", (9, 5))] {
            let opts = LayoutOptions::default()
                .with_end_of_time(Date::year(2100))
                .with_optimise(optimise.0, optimise.1);
            group.bench_with_input(BenchmarkId::new(label, count), &clad, |b, clad| {
                b.iter(|| layout(black_box(clad), black_box(&opts)))
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
