use needlefind::kernel::ResponseMap;
use needlefind::lowlevel::{
    filter_overlapping, select_peaks, suppress_boxes, Extremum, ScoredRect, SelectParams,
    DEFAULT_NMS_OVERLAP,
};
use needlefind::{match_template, ImageView, Method, Point2, Region, RotatedRect, Size2, TemplatePlan};

fn response_with_peaks(peaks: &[(usize, usize, u8)]) -> ResponseMap {
    let (w, h) = (40usize, 30usize);
    let mut image = vec![0u8; w * h];
    for &(x, y, v) in peaks {
        image[y * w + x] = v;
    }
    let view = ImageView::from_slice(&image, w, h).unwrap();
    let one = [1u8];
    let plan = TemplatePlan::from_view(ImageView::from_slice(&one, 1, 1).unwrap()).unwrap();
    match_template(view, &plan, Method::Ccorr).unwrap()
}

#[test]
fn peaks_come_out_best_first_and_respect_the_mask() {
    let mut response = response_with_peaks(&[(5, 5, 200), (7, 6, 190), (30, 20, 150), (20, 2, 40)]);
    let peaks = select_peaks(
        &mut response,
        SelectParams {
            extremum: Extremum::Max,
            threshold: 100.0,
            max_count: 10,
            tpl_width: 6,
            tpl_height: 6,
            max_overlap: 0.5,
        },
    );
    let found: Vec<(usize, usize)> = peaks.iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(found, vec![(5, 5), (30, 20)]);
}

#[test]
fn nms_keeps_lowest_box_of_a_cluster() {
    let boxes = [
        Region::new(10.0, 10.0, 20.0, 20.0),
        Region::new(12.0, 12.0, 20.0, 20.0),
        Region::new(60.0, 60.0, 20.0, 20.0),
        Region::new(11.0, 10.0, 20.0, 20.0),
    ];
    assert_eq!(suppress_boxes(&boxes, DEFAULT_NMS_OVERLAP), vec![1, 2]);

    let touching = [
        Region::new(0.0, 0.0, 10.0, 10.0),
        Region::new(8.0, 0.0, 10.0, 10.0),
    ];
    assert_eq!(suppress_boxes(&touching, DEFAULT_NMS_OVERLAP).len(), 2);
}

#[test]
fn rotated_overlap_keeps_the_stronger_detection() {
    let rect = |cx: f64, angle: f64, score: f64| ScoredRect {
        rect: RotatedRect::new(Point2::new(cx, 20.0), Size2::new(10.0, 10.0), angle),
        score,
    };
    let rects = [
        rect(20.0, 0.0, 0.7),
        rect(21.0, 15.0, 0.9),
        rect(60.0, 0.0, 0.8),
    ];
    assert_eq!(filter_overlapping(&rects, Extremum::Max, 0.5), vec![1, 2]);
    assert_eq!(filter_overlapping(&rects, Extremum::Min, 0.5), vec![0, 2]);

    let nested = [
        ScoredRect {
            rect: RotatedRect::new(Point2::new(20.0, 20.0), Size2::new(30.0, 30.0), 0.0),
            score: 0.6,
        },
        ScoredRect {
            rect: RotatedRect::new(Point2::new(20.0, 20.0), Size2::new(4.0, 4.0), 10.0),
            score: 0.95,
        },
    ];
    assert_eq!(filter_overlapping(&nested, Extremum::Max, 0.99), vec![1]);
}
