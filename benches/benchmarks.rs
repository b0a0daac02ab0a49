// benches/benchmarks.rs — Performance benchmarks (criterion)
//
//   1. History append at steady state (every append evicts)
//   2. Unbounded append for comparison
//   3. Transcript render for a full five-step run

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use reflection_agent::core::history::{BoundedHistory, Capacity};
use reflection_agent::core::transcript::TranscriptLog;
use reflection_agent::core::types::CompletionTag;
use reflection_agent::provider::Message;

fn draft(i: usize) -> String {
    format!("Draft #{i}: a paragraph long enough to look like a real completion, give or take.")
}

fn bench_bounded_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_append_bounded");
    for capacity in [3usize, 16, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &cap| {
            let mut history = BoundedHistory::new(
                [Message::system("system prompt")],
                Capacity::Bounded(cap),
                1,
            );
            let mut i = 0;
            b.iter(|| {
                history
                    .append(Message::user(draft(i)))
                    .expect("append within range");
                i += 1;
                black_box(history.len());
            });
        });
    }
    group.finish();
}

fn bench_unbounded_append(c: &mut Criterion) {
    c.bench_function("history_append_unbounded_1k", |b| {
        b.iter(|| {
            let mut history = BoundedHistory::unbounded([Message::system("system prompt")]);
            for i in 0..1000 {
                history
                    .append(Message::assistant(draft(i)))
                    .expect("unbounded append");
            }
            black_box(history.len());
        });
    });
}

fn bench_transcript_render(c: &mut Criterion) {
    let mut log = TranscriptLog::new();
    for i in 0..5 {
        log.record(CompletionTag::Generation, &draft(i));
        log.record(CompletionTag::Reflection, "Tighten the second sentence.");
    }
    log.record_stop();

    c.bench_function("transcript_render_5_steps", |b| {
        b.iter(|| black_box(log.render()));
    });
}

criterion_group!(
    benches,
    bench_bounded_append,
    bench_unbounded_append,
    bench_transcript_render
);
criterion_main!(benches);
