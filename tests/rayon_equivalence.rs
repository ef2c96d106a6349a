#![cfg(feature = "rayon")]

use needlefind::kernel::scalar::ScalarKernel;
use needlefind::lowlevel::{cross_correlate_with, DefaultKernel, Kernel};
use needlefind::{Finder, ImageView, MatchOptions, PixelBuffer, TemplatePlan};

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push((((x * 11) ^ (y * 3) ^ (x * y)) & 0xFF) as u8);
        }
    }
    data
}

#[test]
fn parallel_rows_match_sequential_rows() {
    let (w, h) = (70, 50);
    let image = make_image(w, h);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let tpl = view.crop(9, 13, 17, 11).unwrap().to_owned_image();
    let plan = TemplatePlan::from_view(tpl.view()).unwrap();

    let (parallel, out_w, out_h) = cross_correlate_with::<DefaultKernel>(view, &plan).unwrap();
    let mut sequential = vec![0.0f64; out_w * out_h];
    for (y, row) in sequential.chunks_mut(out_w).enumerate() {
        ScalarKernel::correlate_row(view, &plan, y, row);
    }
    for (a, b) in parallel.iter().zip(&sequential) {
        assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0));
    }
}

#[test]
fn finder_results_are_stable_across_runs() {
    let (w, h) = (70, 50);
    let image = make_image(w, h);
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let tpl = view.crop(30, 20, 12, 9).unwrap().to_owned_image();

    let finder = Finder::new(MatchOptions::default());
    let haystack = PixelBuffer::gray(image.clone(), w, h);
    let needle = PixelBuffer::gray(tpl.into_vec(), 12, 9);
    let runs: Vec<_> = (0..4)
        .map(|_| finder.find_matches(&haystack, &needle).unwrap())
        .collect();
    assert!(runs.windows(2).all(|r| r[0] == r[1]));
    assert_eq!(runs[0][0].location.left, 30.0);
}
