// This work is dedicated to the public domain under the CC0 1.0 Universal license.
// To the extent possible under law, the author has waived all copyright
// and related or neighboring rights to this work.
// https://creativecommons.org/publicdomain/zero/1.0/

use criterion::{criterion_group, criterion_main, Criterion};
use std::f64::consts::PI;

use reemd::ceemdan::Ceemdan;
use reemd::eemd::{emd, Eemd};
use reemd::emd_core::EemdConfig;
use reemd::extrema::Extrema;
use reemd::spline::SplineWorkspace;

const N: usize = 4096;

fn make_signal(n: usize) -> Vec<f64> {
    let dt = 1.0 / n as f64;
    (0..n)
        .map(|i| {
            let t = i as f64 * dt;
            (2.0 * PI * 10.0 * t).sin()
                + 0.7 * (2.0 * PI * 50.0 * t).sin()
                + 0.5 * (2.0 * PI * 200.0 * t).sin()
        })
        .collect()
}

fn bench_find_extrema(c: &mut Criterion) {
    let signal = make_signal(N);
    let mut extrema = Extrema::with_capacity(N);

    c.bench_function("find_extrema_N4096", |b| {
        b.iter(|| {
            let good = extrema.find(&signal);
            std::hint::black_box(good);
        });
    });
}

fn bench_envelope_spline(c: &mut Criterion) {
    let signal = make_signal(N);
    let mut extrema = Extrema::with_capacity(N);
    extrema.find(&signal);
    let mut workspace = SplineWorkspace::new(N);
    let mut envelope = vec![0.0; N];

    c.bench_function("upper_envelope_N4096", |b| {
        b.iter(|| {
            workspace
                .evaluate(&extrema.max_x, &extrema.max_y, &mut envelope)
                .unwrap();
            std::hint::black_box(&envelope);
        });
    });
}

fn bench_emd(c: &mut Criterion) {
    let signal = make_signal(N);

    c.bench_function("emd_N4096_S4", |b| {
        b.iter(|| {
            let imfs = emd(&signal, 4, 50).unwrap();
            std::hint::black_box(imfs);
        });
    });
}

fn bench_eemd(c: &mut Criterion) {
    let signal = make_signal(N);
    let config = EemdConfig {
        ensemble_size: 50,
        noise_strength: 0.2,
        s_number: 4,
        num_siftings: 50,
        ..Default::default()
    };

    c.bench_function("eemd_N4096_E50", |b| {
        b.iter(|| {
            let imfs = Eemd::new(config.clone()).decompose(&signal).unwrap();
            std::hint::black_box(imfs);
        });
    });
}

fn bench_ceemdan(c: &mut Criterion) {
    let signal = make_signal(1024);
    let config = EemdConfig {
        ensemble_size: 50,
        noise_strength: 0.2,
        s_number: 4,
        num_siftings: 50,
        ..Default::default()
    };

    c.bench_function("ceemdan_N1024_E50", |b| {
        b.iter(|| {
            let imfs = Ceemdan::new(config.clone()).decompose(&signal).unwrap();
            std::hint::black_box(imfs);
        });
    });
}

criterion_group!(
    benches,
    bench_find_extrema,
    bench_envelope_spline,
    bench_emd,
    bench_eemd,
    bench_ceemdan
);
criterion_main!(benches);
