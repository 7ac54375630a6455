use chrono::TimeDelta;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kaala_search::{
    ALL_ASPECTS, Body, IngressConfig, MeanMotionEphemeris, NatalPoint, SolarReturnConfig,
    TransitConfig, exact_solar_return, find_ingresses, find_transit_aspects, j2000,
};

fn solar_return_bench(c: &mut Criterion) {
    let eph = MeanMotionEphemeris::default();
    let approx = j2000() + TimeDelta::days(3653);

    let mut group = c.benchmark_group("search_solar_return");
    group.sample_size(20);
    for (name, config) in [
        ("grid", SolarReturnConfig::default()),
        ("bisection", SolarReturnConfig::bisection()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| exact_solar_return(&eph, black_box(100.0), black_box(approx), &config))
        });
    }
    group.finish();
}

fn transit_bench(c: &mut Criterion) {
    let eph = MeanMotionEphemeris::default();
    let points = [
        NatalPoint::new("Sun", 280.5),
        NatalPoint::new("Moon", 45.0),
        NatalPoint::new("Lagna", 123.0),
    ];
    let end = j2000() + TimeDelta::days(90);
    let config = TransitConfig::default();

    let mut group = c.benchmark_group("search_transits");
    group.sample_size(10);
    group.bench_function("moon_sun_mars_90d", |b| {
        b.iter(|| {
            find_transit_aspects(
                &eph,
                black_box(&points),
                &[Body::Moon, Body::Sun, Body::Mars],
                &ALL_ASPECTS,
                j2000(),
                end,
                &config,
            )
        })
    });
    group.bench_function("ingresses_all_bodies_90d", |b| {
        b.iter(|| {
            find_ingresses(
                &eph,
                black_box(&kaala_search::ALL_BODIES),
                j2000(),
                end,
                &IngressConfig::default(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, solar_return_bench, transit_bench);
criterion_main!(benches);
