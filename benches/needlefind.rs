use criterion::{criterion_group, criterion_main, Criterion};
use needlefind::{
    match_template, Finder, ImageView, MatchOptions, Method, PixelBuffer, RotationOptions,
    TemplatePlan,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn bench_correlation(c: &mut Criterion) {
    let (w, h) = (320, 240);
    let image = make_image(w, h);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let tpl = view.crop(100, 80, 48, 40).unwrap().to_owned_image();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();

    let mut group = c.benchmark_group("match_template");
    for method in [Method::CcoeffNormed, Method::SqdiffNormed, Method::Ccorr] {
        group.bench_function(method.name(), |b| {
            b.iter(|| black_box(match_template(black_box(view), &plan, method).unwrap()))
        });
    }
    group.finish();
}

fn bench_finder(c: &mut Criterion) {
    let (w, h) = (320, 240);
    let image = make_image(w, h);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let tpl = view.crop(100, 80, 48, 40).unwrap().to_owned_image();
    let haystack = PixelBuffer::gray(image.clone(), w, h);
    let needle = PixelBuffer::gray(tpl.into_vec(), 48, 40);

    let plain = Finder::new(MatchOptions::default());
    c.bench_function("find_match", |b| {
        b.iter(|| black_box(plain.find_match(&haystack, &needle).unwrap()))
    });

    let multi = Finder::new(MatchOptions {
        search_multiple_scales: true,
        ..MatchOptions::default()
    });
    c.bench_function("find_matches_multi_scale", |b| {
        b.iter(|| black_box(multi.find_matches(&haystack, &needle).unwrap()))
    });

    let rotated = Finder::new(MatchOptions {
        rotation: Some(RotationOptions {
            tolerance_deg: 30.0,
            ..RotationOptions::default()
        }),
        ..MatchOptions::default()
    });
    c.bench_function("find_match_rotation", |b| {
        b.iter(|| black_box(rotated.find_match(&haystack, &needle).unwrap()))
    });
}

criterion_group!(benches, bench_correlation, bench_finder);
criterion_main!(benches);
