#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use geo::{Line, coord};
use racer::simulation::borders::{BorderIndex, ray_crosses_rect, ray_segment_intersection};
use racer::simulation::geometry::{LineSegment, Point2, rotate};
use racer::simulation::params::BORDER_MIN_UNIQUE;
use racer::simulation::track::TrackMesh;

fn square_box(half: f32) -> Vec<LineSegment> {
    let corners = [
        coord! { x: -half, y: -half },
        coord! { x: half, y: -half },
        coord! { x: half, y: half },
        coord! { x: -half, y: half },
    ];
    (0..4)
        .map(|i| Line::new(corners[i], corners[(i + 1) % 4]))
        .collect()
}

fn brute_force(segments: &[LineSegment], origin: Point2, dir: Point2, max_range: f32) -> f32 {
    segments
        .iter()
        .filter_map(|s| ray_segment_intersection(origin, dir, s))
        .fold(max_range, f32::min)
}

#[test]
fn test_square_box_raycast_from_center() {
    let index = BorderIndex::build(square_box(5.0), 8).unwrap();
    assert_eq!(index.tree().depth(), 0);

    let up = coord! { x: 0.0, y: 1.0 };
    let distance = index.raycast_one(coord! { x: 0.0, y: 0.0 }, up, 100.0);

    assert_eq!(distance, 5.0);
}

#[test]
fn test_miss_reports_max_range() {
    let index = BorderIndex::build(square_box(5.0), 8).unwrap();

    // From outside the box, pointing away from it.
    let origin = coord! { x: 20.0, y: 0.0 };
    let away = coord! { x: 1.0, y: 0.0 };
    assert_eq!(index.raycast_one(origin, away, 30.0), 30.0);
}

#[test]
fn test_hit_beyond_range_is_capped() {
    let index = BorderIndex::build(square_box(5.0), 8).unwrap();
    let up = coord! { x: 0.0, y: 1.0 };

    assert_eq!(index.raycast_one(coord! { x: 0.0, y: 0.0 }, up, 3.0), 3.0);
}

#[test]
fn test_ray_segment_intersection() {
    let segment = Line::new(coord! { x: -5.0, y: 5.0 }, coord! { x: 5.0, y: 5.0 });
    let origin = coord! { x: 0.0, y: 0.0 };

    let hit = ray_segment_intersection(origin, coord! { x: 0.0, y: 1.0 }, &segment);
    assert_eq!(hit, Some(5.0));

    // Behind the ray.
    assert_eq!(
        ray_segment_intersection(origin, coord! { x: 0.0, y: -1.0 }, &segment),
        None
    );
    // Parallel.
    assert_eq!(
        ray_segment_intersection(origin, coord! { x: 1.0, y: 0.0 }, &segment),
        None
    );
    // Past the segment's end.
    let steep = rotate(coord! { x: 0.0, y: 1.0 }, -1.2);
    assert_eq!(ray_segment_intersection(origin, steep, &segment), None);
}

#[test]
fn test_ray_crosses_rect() {
    let rect = geo::Rect::new(coord! { x: 10.0, y: -1.0 }, coord! { x: 12.0, y: 1.0 });
    let origin = coord! { x: 0.0, y: 0.0 };

    assert!(ray_crosses_rect(origin, coord! { x: 1.0, y: 0.0 }, &rect));
    assert!(!ray_crosses_rect(origin, coord! { x: -1.0, y: 0.0 }, &rect));
    assert!(!ray_crosses_rect(origin, coord! { x: 0.0, y: 1.0 }, &rect));
    // Origin inside always counts.
    assert!(ray_crosses_rect(
        coord! { x: 11.0, y: 0.0 },
        coord! { x: 0.0, y: 1.0 },
        &rect
    ));
}

#[test]
fn test_indexed_raycast_matches_brute_force() {
    let segments = TrackMesh::ring(40.0, 60.0, 48).boundary().unwrap();

    for threshold in [3, BORDER_MIN_UNIQUE] {
        let index = BorderIndex::build(segments.clone(), threshold).unwrap();
        assert!(index.tree().leaves().count() > 1);

        let max_range = 50.0;
        for k in 0..24 {
            let angle = k as f32 * 0.2618;
            let origin = rotate(coord! { x: 50.0, y: 0.0 }, angle);
            for r in 0..16 {
                let dir = rotate(coord! { x: 0.0, y: 1.0 }, r as f32 * 0.3927 + 0.01);
                let indexed = index.raycast_one(origin, dir, max_range);
                let expected = brute_force(&segments, origin, dir, max_range);
                assert!(
                    (indexed - expected).abs() < 1e-4,
                    "threshold {threshold} origin {origin:?} dir {dir:?}: {indexed} vs {expected}"
                );
            }
        }
    }
}

#[test]
fn test_candidate_leaves_outlive_the_query() {
    let segments = TrackMesh::ring(40.0, 60.0, 48).boundary().unwrap();
    let index = BorderIndex::build(segments, BORDER_MIN_UNIQUE).unwrap();

    let near = index.candidate_leaves(coord! { x: 50.0, y: 0.0 }, 5.0);
    let far = index.candidate_leaves(coord! { x: -50.0, y: 0.0 }, 5.0);

    assert!(!near.is_empty() && !far.is_empty());
    for leaf in near.iter().chain(&far) {
        assert!(!leaf.primitives.is_empty());
    }
}

#[test]
fn test_larger_range_never_examines_fewer_leaves() {
    let segments = TrackMesh::ring(40.0, 60.0, 48).boundary().unwrap();
    let index = BorderIndex::build(segments, 3).unwrap();
    let origin = coord! { x: 50.0, y: 0.0 };

    let mut previous = 0;
    for range in [1.0, 5.0, 10.0, 25.0, 50.0, 200.0] {
        let count = index.candidate_leaves(origin, range).len();
        assert!(count >= previous);
        previous = count;
    }
    assert_eq!(previous, index.tree().leaves().count());
}

#[test]
fn test_larger_range_only_uncaps_hits() {
    let segments = TrackMesh::ring(40.0, 60.0, 48).boundary().unwrap();
    let index = BorderIndex::build(segments, 3).unwrap();
    let origin = coord! { x: 50.0, y: 0.0 };
    let dir = coord! { x: 1.0, y: 0.0 };

    let full = index.raycast_one(origin, dir, 1000.0);
    assert!(full < 11.0);
    for range in [2.0, 5.0, 9.0, 20.0, 100.0] {
        assert_eq!(index.raycast_one(origin, dir, range), full.min(range));
    }
}
