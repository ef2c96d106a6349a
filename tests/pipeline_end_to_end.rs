use needlefind::image::resize::resize_by;
use needlefind::{
    Finder, MatchOptions, MatchOverrides, Method, OwnedImage, PixelBuffer, Region,
    RotationOptions,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn noise(seed: u64, width: usize, height: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..width * height).map(|_| rng.random::<u8>()).collect()
}

fn paste(dst: &mut [u8], dst_w: usize, src: &[u8], src_w: usize, src_h: usize, x0: usize, y0: usize) {
    for y in 0..src_h {
        let row = &src[y * src_w..(y + 1) * src_w];
        dst[(y0 + y) * dst_w + x0..(y0 + y) * dst_w + x0 + src_w].copy_from_slice(row);
    }
}

/// Smooth, asymmetric intensity pattern sampled at continuous coordinates.
fn pattern(u: f64, v: f64) -> f64 {
    128.0
        + 55.0 * (u * 0.25 + 0.3).sin() * (v * 0.18).cos()
        + 45.0 * ((u * 0.5 - v * 0.35) * 0.35).sin()
        + 0.6 * (u - v)
}

fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let mut diff = (a - b) % 360.0;
    if diff < -180.0 {
        diff += 360.0;
    }
    if diff >= 180.0 {
        diff -= 360.0;
    }
    diff.abs()
}

#[test]
fn exact_copy_is_found_at_its_position() {
    let (w, h) = (64, 48);
    let hay = noise(1, w, h);
    let needle = OwnedImage::new(hay.clone(), w, h)
        .unwrap()
        .view()
        .crop(17, 9, 16, 12)
        .unwrap()
        .to_owned_image();

    let finder = Finder::new(MatchOptions::default());
    let haystack = PixelBuffer::gray(hay, w, h);
    let needle = PixelBuffer::gray(needle.into_vec(), 16, 12);

    let best = finder.find_match(&haystack, &needle).unwrap();
    assert_eq!(best.location, Region::new(17.0, 9.0, 16.0, 12.0));
    assert!(best.confidence > 0.999);

    for method in [Method::SqdiffNormed, Method::CcorrNormed] {
        let overrides = MatchOverrides {
            method: Some(method),
            confidence: Some(0.9),
            ..MatchOverrides::default()
        };
        let best = finder.find_match_with(&haystack, &needle, &overrides).unwrap();
        assert_eq!(best.location.left, 17.0, "{}", method.name());
        assert_eq!(best.location.top, 9.0, "{}", method.name());
    }
}

#[test]
fn every_copy_is_reported_once_and_runs_are_deterministic() {
    let (w, h) = (90, 60);
    let needle = noise(2, 14, 10);
    let mut hay = vec![90u8; w * h];
    for &(x, y) in &[(4usize, 5usize), (50, 8), (30, 40)] {
        paste(&mut hay, w, &needle, 14, 10, x, y);
    }
    let haystack = PixelBuffer::gray(hay, w, h);
    let needle = PixelBuffer::gray(needle, 14, 10);
    let finder = Finder::new(MatchOptions {
        confidence: 0.95,
        ..MatchOptions::default()
    });

    let first = finder.find_matches(&haystack, &needle).unwrap();
    let second = finder.find_matches(&haystack, &needle).unwrap();
    assert_eq!(first, second);

    let mut tops: Vec<(f64, f64)> = first
        .iter()
        .map(|m| (m.location.left, m.location.top))
        .collect();
    tops.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.total_cmp(&b.0)));
    assert_eq!(tops, vec![(4.0, 5.0), (50.0, 8.0), (30.0, 40.0)]);
    assert!(first.windows(2).all(|p| p[0].confidence >= p[1].confidence));
}

#[test]
fn scaled_down_copy_is_found_by_the_needle_sweep() {
    let (nw, nh) = (30, 30);
    let needle = noise(5, nw, nh);
    let needle_img = OwnedImage::new(needle.clone(), nw, nh).unwrap();
    let small = resize_by(needle_img.view(), 0.8).unwrap();
    assert_eq!((small.width(), small.height()), (24, 24));

    let (w, h) = (80, 60);
    let mut hay = noise(3, w, h);
    paste(&mut hay, w, small.data(), 24, 24, 37, 21);

    let finder = Finder::new(MatchOptions {
        confidence: 0.95,
        search_multiple_scales: true,
        ..MatchOptions::default()
    });
    let best = finder
        .find_match(&PixelBuffer::gray(hay, w, h), &PixelBuffer::gray(needle, nw, nh))
        .unwrap();
    assert_eq!(best.location, Region::new(37.0, 21.0, 24.0, 24.0));
    assert!(best.confidence > 0.999);
}

fn pattern_needle(nw: usize, nh: usize) -> Vec<u8> {
    (0..nw * nh)
        .map(|i| pattern((i % nw) as f64, (i / nw) as f64).round().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Noise haystack with the pattern needle rotated counter-clockwise by
/// `theta` about `(cx, cy)`.
fn rotated_scene(
    seed: u64,
    (w, h): (usize, usize),
    (nw, nh): (usize, usize),
    theta: f64,
    (cx, cy): (f64, f64),
) -> Vec<u8> {
    let (nc_x, nc_y) = ((nw as f64 - 1.0) / 2.0, (nh as f64 - 1.0) / 2.0);
    let (sin, cos) = theta.to_radians().sin_cos();
    let mut hay = noise(seed, w, h);
    for y in 0..h {
        for x in 0..w {
            // Inverse of a counter-clockwise rotation by theta around (cx, cy).
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            let u = dx * cos - dy * sin + nc_x;
            let v = dx * sin + dy * cos + nc_y;
            if (0.0..=nw as f64 - 1.0).contains(&u) && (0.0..=nh as f64 - 1.0).contains(&v) {
                hay[y * w + x] = pattern(u, v).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    hay
}

#[test]
fn rotated_copy_is_found_with_its_angle() {
    let (nw, nh) = (40usize, 40usize);
    let needle = pattern_needle(nw, nh);
    let (w, h) = (120usize, 100usize);
    let theta = 12.0f64;
    let (cx, cy) = (62.0, 48.0);
    let hay = rotated_scene(4, (w, h), (nw, nh), theta, (cx, cy));

    let finder = Finder::new(MatchOptions {
        confidence: 0.7,
        rotation: Some(RotationOptions {
            tolerance_deg: 20.0,
            min_reduced_area: 256,
            max_results: 5,
            ..RotationOptions::default()
        }),
        ..MatchOptions::default()
    });
    let found = finder
        .find_rotated_matches(
            &PixelBuffer::gray(hay, w, h),
            &PixelBuffer::gray(needle, nw, nh),
            &MatchOverrides::default(),
        )
        .unwrap();

    let best = found[0];
    let step = (2.0f64 / 40.0).atan().to_degrees();
    assert!(
        angle_diff_deg(best.angle_deg, theta) <= step,
        "angle {} vs {theta}",
        best.angle_deg
    );
    assert!((best.center.x - cx).abs() < 2.0, "center x {}", best.center.x);
    assert!((best.center.y - cy).abs() < 2.0, "center y {}", best.center.y);
    assert!(best.score >= 0.7);
    assert_eq!((best.size.width, best.size.height), (40.0, 40.0));
}

fn unrotated_paste_top_left(hay_size: (usize, usize), at: (usize, usize)) -> (f64, f64, f64) {
    let (w, h) = hay_size;
    let needle = noise(21, 40, 40);
    let mut hay = noise(20, w, h);
    paste(&mut hay, w, &needle, 40, 40, at.0, at.1);

    let finder = Finder::new(MatchOptions {
        confidence: 0.5,
        rotation: Some(RotationOptions {
            tolerance_deg: 0.0,
            min_reduced_area: 256,
            ..RotationOptions::default()
        }),
        ..MatchOptions::default()
    });
    let found = finder
        .find_rotated_matches(
            &PixelBuffer::gray(hay, w, h),
            &PixelBuffer::gray(needle, 40, 40),
            &MatchOverrides::default(),
        )
        .unwrap();
    let best = found[0];
    assert!(best.angle_deg.abs() < 1e-9, "angle {}", best.angle_deg);
    assert_eq!((best.size.width, best.size.height), (40.0, 40.0));
    (best.score, best.top_left.x, best.top_left.y)
}

#[test]
fn multi_level_refinement_keeps_exact_position_without_rotation() {
    let (score, x, y) = unrotated_paste_top_left((160, 130), (60, 40));
    assert!(score > 0.99, "score {score}");
    assert!((x - 60.0).abs() < 1e-6, "x {x}");
    assert!((y - 40.0).abs() < 1e-6, "y {y}");
}

#[test]
fn multi_level_refinement_on_a_tight_haystack() {
    let (score, x, y) = unrotated_paste_top_left((128, 128), (64, 32));
    assert!(score > 0.99, "score {score}");
    assert!((x - 64.0).abs() < 1e-6, "x {x}");
    assert!((y - 32.0).abs() < 1e-6, "y {y}");
}

#[test]
fn rotated_copies_are_centered_within_a_pixel() {
    let (nw, nh) = (40usize, 40usize);
    let (w, h) = (140usize, 120usize);
    let (cx, cy) = (70.0, 58.0);
    let step = (2.0f64 / 40.0).atan().to_degrees();
    let finder = Finder::new(MatchOptions {
        confidence: 0.7,
        rotation: Some(RotationOptions {
            tolerance_deg: 180.0,
            min_reduced_area: 256,
            max_results: 5,
            subpixel: true,
            ..RotationOptions::default()
        }),
        ..MatchOptions::default()
    });
    let needle = PixelBuffer::gray(pattern_needle(nw, nh), nw, nh);

    for theta in [-25.0f64, 45.0, 90.0, -170.0] {
        let hay = rotated_scene(30, (w, h), (nw, nh), theta, (cx, cy));
        let found = finder
            .find_rotated_matches(
                &PixelBuffer::gray(hay, w, h),
                &needle,
                &MatchOverrides::default(),
            )
            .unwrap();
        let best = found[0];
        assert!(
            angle_diff_deg(best.angle_deg, theta) <= step,
            "theta {theta}: angle {}",
            best.angle_deg
        );
        assert!(
            (best.center.x - cx).abs() < 1.0 && (best.center.y - cy).abs() < 1.0,
            "theta {theta}: center ({}, {})",
            best.center.x,
            best.center.y
        );
        assert!(best.score >= 0.7, "theta {theta}: score {}", best.score);
    }
}
