
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use primal_tiling::diagnostics::NullSink;
use primal_tiling::example_gen::{generate_candidate_pairs, generate_panel};
use primal_tiling::region::RegionResolver;
use primal_tiling::resolver_config::RegionConfigBuilder;
use primal_tiling::sequence_alignment::GlocalAligner;
use primal_tiling::thermo::NearestNeighborThermo;

pub fn bench_region(c: &mut Criterion) {
    let seq_lens = [2000, 10000];
    let num_references = [8, 30];
    let variant_rates = [0.0, 0.01];
    let num_pairs = 10;

    let thermo = NearestNeighborThermo::default();
    let mut benchmark_group = c.benchmark_group("region-group");
    benchmark_group.sample_size(10);

    for &sl in seq_lens.iter() {
        for &nr in num_references.iter() {
            for &vr in variant_rates.iter() {
                let (consensus, references) = generate_panel(sl, nr, vr, 0).unwrap();
                let pairs = generate_candidate_pairs(&consensus, "bench", 100, num_pairs, 22, 400, &thermo).unwrap();

                for parallel in [false, true] {
                    let config = RegionConfigBuilder::default()
                        .prefix("bench")
                        .parallel_alignment(parallel)
                        .build().unwrap();
                    let resolver = RegionResolver::new(&references, &GlocalAligner, &thermo, &config);

                    let test_label = format!("region_{sl}x{nr}x{num_pairs}_{vr}_par{parallel}");
                    benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                        black_box({
                            resolver.resolve(0, 100, pairs.clone(), &mut NullSink).unwrap()
                        });
                    }));
                }
            }
        }
    }

    benchmark_group.finish();
}

criterion_group!(benches, bench_region);
criterion_main!(benches);
