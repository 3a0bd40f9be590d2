use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pcmconv_core::{samples_as_bytes, AudioSpec, ConversionPlan, SampleFormat, StreamState};

// One second of audio at the source rate
const CASES: [(u32, u32); 5] = [
    (44100, 22050),
    (8000, 16000),
    (8000, 11025),
    (48000, 8000),
    (22050, 44100),
];

fn mono(rate: u32) -> AudioSpec {
    AudioSpec::new(SampleFormat::S16_SYSTEM, 1, rate)
}

fn signal(frames: usize) -> Vec<u8> {
    let samples: Vec<i16> = (0..frames)
        .map(|i| ((i as f64 * 0.05).sin() * 12000.0) as i16)
        .collect();
    samples_as_bytes(&samples).to_vec()
}

fn bench_one_shot(c: &mut Criterion) {
    let mut group = c.benchmark_group("one_shot");
    for (from, to) in CASES {
        let plan = ConversionPlan::new(&mono(from), &mono(to)).unwrap();
        let input = signal(from as usize);
        let mut buffer = vec![0u8; plan.required_capacity(input.len())];

        group.throughput(Throughput::Elements(from as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_to_{}", from, to)),
            &input,
            |b, input| {
                b.iter(|| {
                    buffer[..input.len()].copy_from_slice(input);
                    black_box(plan.convert(&mut buffer, input.len()).unwrap())
                })
            },
        );
    }
    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");
    for (from, to) in CASES {
        let plan = ConversionPlan::new(&mono(from), &mono(to)).unwrap();
        let frames = (from as usize / 50).max(plan.min_stream_frames());
        let input = signal(frames);
        let mut buffer = vec![0u8; plan.required_capacity(input.len())];
        let mut state = StreamState::new(&plan);

        group.throughput(Throughput::Elements(frames as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_to_{}", from, to)),
            &input,
            |b, input| {
                b.iter(|| {
                    buffer[..input.len()].copy_from_slice(input);
                    black_box(plan.convert_stream(&mut state, &mut buffer, input.len()).unwrap())
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_one_shot, bench_streaming);
criterion_main!(benches);
