use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mushroom_lab::edibility::{
    classify, Bruises, CapColor, CapShape, CapSurface, CategoricalFeature, GillColor,
    MushroomFeatureSet, Odor,
};
use mushroom_lab::pipeline::{DatasetTrainingPipeline, EvaluationRequest, PipelineConfig};
use mushroom_lab::training::{ModelFamily, ModelParams};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn all_feature_sets() -> Vec<MushroomFeatureSet> {
    let mut sets = Vec::new();
    for &odor in Odor::all() {
        for &bruises in Bruises::all() {
            for &gill in GillColor::all() {
                for &shape in CapShape::all() {
                    for &surface in CapSurface::all() {
                        for &color in CapColor::all() {
                            sets.push(MushroomFeatureSet::new(
                                odor, bruises, gill, shape, surface, color,
                            ));
                        }
                    }
                }
            }
        }
    }
    sets
}

fn create_mushroom_table(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let odors = ["a", "l", "n", "f", "p", "y"];
    let gills = ["k", "n", "b", "w", "p", "h"];

    let mut odor = Vec::with_capacity(n_rows);
    let mut gill = Vec::with_capacity(n_rows);
    let mut class = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let o = *odors.choose(&mut rng).unwrap_or(&"n");
        odor.push(o);
        gill.push(*gills.choose(&mut rng).unwrap_or(&"k"));
        class.push(if matches!(o, "a" | "l" | "n") { "e" } else { "p" });
    }

    df!("odor" => odor, "gill-color" => gill, "class" => class).unwrap()
}

fn bench_rules(c: &mut Criterion) {
    let sets = all_feature_sets();
    c.bench_function("classify_whole_domain", |b| {
        b.iter(|| {
            sets.iter()
                .filter(|f| classify(black_box(f)).is_fallback())
                .count()
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    let df = create_mushroom_table(2000);
    let pipeline = DatasetTrainingPipeline::new(PipelineConfig::default().with_random_seed(0));

    for family in [
        ModelFamily::LogisticRegression,
        ModelFamily::DecisionTree,
        ModelFamily::Knn,
        ModelFamily::GaussianNaiveBayes,
    ] {
        let request = EvaluationRequest::new(ModelParams::default_for(family));
        group.bench_with_input(BenchmarkId::new("run", family.as_str()), &df, |b, df| {
            b.iter(|| pipeline.run(black_box(df), &request).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rules, bench_pipeline);
criterion_main!(benches);
