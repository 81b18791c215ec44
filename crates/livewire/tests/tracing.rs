use std::sync::Arc;

use livewire::{
    AnchorOutcome, CostModel, CostWeights, Direction, EngineConfig, Error, FeatureConfig, FeatureWeights,
    LinkCost, LiveWire, PathSearch, Pixel, Raster, SearchState, compute_features,
};

fn px(pts: &[(usize, usize)]) -> Vec<Pixel> {
    pts.iter().map(|&(x, y)| Pixel::new(x, y)).collect()
}

fn uniform(width: usize, height: usize) -> LiveWire {
    LiveWire::from_f32(width, height, vec![0.5; width * height], EngineConfig::default())
        .expect("valid raster")
}

/// Static cost of any link on a constant raster: no crossings, no gradient,
/// zero tangents on both ends.
fn uniform_link_cost() -> f32 {
    0.43 + 0.43 + 0.14 * (2.0 / 3.0)
}

#[test_log::test]
fn bright_diagonal_is_followed() {
    let n = 5;
    let mut data = vec![0u8; n * n];
    for i in 0..n {
        data[i * n + i] = 255;
    }
    let raster = Raster::from_u8(n, n, &data).expect("valid raster");
    let mut lw = LiveWire::load_raster(raster, EngineConfig::default()).expect("valid config");

    lw.seed(0, 0).expect("seed");
    let path = lw.preview(4, 4).expect("reachable");
    assert_eq!(path, px(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]));
}

#[test_log::test]
fn bent_ridge_beats_the_direct_diagonal() {
    let n = 11;
    let on_ridge =
        |p: Pixel| (p.y == 1 && (1..10).contains(&p.x)) || (p.x == 9 && (1..10).contains(&p.y));
    let mut data = vec![0u8; n * n];
    for y in 0..n {
        for x in 0..n {
            if on_ridge(Pixel::new(x, y)) {
                data[y * n + x] = 255;
            }
        }
    }
    let raster = Raster::from_u8(n, n, &data).expect("valid raster");
    let mut lw = LiveWire::load_raster(raster, EngineConfig::default()).expect("valid config");

    lw.seed(1, 1).expect("seed");
    let path = lw.preview(9, 9).expect("reachable");

    assert_eq!(path.first(), Some(&Pixel::new(1, 1)));
    assert_eq!(path.last(), Some(&Pixel::new(9, 9)));
    // The straight diagonal (1,1)..(9,9) has 9 points; the ridge route is longer.
    assert!(path.len() > 9, "path took the diagonal: {path:?}");
    let off = path.iter().filter(|&&p| !on_ridge(p)).count();
    assert!(off <= 1, "{off} points left the ridge: {path:?}");
    assert!(path.iter().all(|p| on_ridge(*p) || p.chebyshev(Pixel::new(9, 1)) == 1));
}

#[test]
fn uniform_raster_gives_the_diagonal_staircase() {
    let mut lw = uniform(5, 5);
    lw.seed(0, 0).expect("seed");
    let path = lw.extract_path(4, 4).expect("reachable");
    assert_eq!(path, px(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]));

    let session = lw.session().expect("live session");
    let cost = session
        .parent_map()
        .cost(Pixel::new(4, 4))
        .expect("finalized");
    assert!((cost - 4.0 * uniform_link_cost()).abs() < 1e-4, "cost {cost}");
}

#[test]
fn anchoring_concatenates_segments() {
    let mut lw = uniform(16, 16);
    lw.seed(0, 0).expect("seed A");
    let ab = lw.preview(6, 6).expect("A -> B");
    assert_eq!(ab, px(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)]));

    assert_eq!(lw.anchor(6, 6), Ok(AnchorOutcome::Anchored));
    let abc = lw.preview(12, 0).expect("B -> C");
    assert_eq!(
        abc,
        px(&[
            (0, 0),
            (1, 1),
            (2, 2),
            (3, 3),
            (4, 4),
            (5, 5),
            (6, 6),
            (7, 5),
            (8, 4),
            (9, 3),
            (10, 2),
            (11, 1),
            (12, 0),
        ])
    );
    assert_eq!(abc.iter().filter(|&&p| p == Pixel::new(6, 6)).count(), 1);
    assert_eq!(lw.control_points(), &px(&[(0, 0), (6, 6)])[..]);
}

#[test]
fn isolated_pixel_is_unreachable() {
    let (w, h) = (7, 7);
    let mut data = vec![0.5f32; w * h];
    let island = Pixel::new(4, 4);
    for d in Direction::ALL {
        let q = island.neighbor(d, w, h).expect("interior pixel");
        data[q.index(w)] = f32::NAN;
    }
    let mut lw = LiveWire::from_f32(w, h, data, EngineConfig::default()).expect("valid raster");

    lw.seed(0, 0).expect("seed");
    assert_eq!(lw.preview(4, 4), Err(Error::Unreachable { x: 4, y: 4 }));

    let session = lw.session().expect("session survives");
    assert_eq!(session.state(), SearchState::Exhausted);
    // Everything except the island and its ring was reached.
    assert_eq!(session.parent_map().finalized_count(), w * h - 9);

    // Other targets still resolve after exhaustion.
    assert_eq!(lw.preview(6, 0).expect("reachable").len(), 7);
}

#[test]
fn engine_paths_are_minimal_on_a_textured_raster() {
    let (w, h) = (9, 7);
    let mut state = 0x2545_f491_u32;
    let data: Vec<u8> = (0..w * h)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 256) as u8
        })
        .collect();
    let raster = Raster::from_u8(w, h, &data).expect("valid raster");
    let features = Arc::new(compute_features(&raster, &FeatureConfig::default()));
    let mut costs = CostModel::new(
        Arc::clone(&features),
        &CostWeights::default(),
        FeatureWeights::neutral(),
    )
    .expect("valid weights");

    let seed = Pixel::new(4, 3);
    let mut dist = vec![f32::INFINITY; w * h];
    dist[seed.index(w)] = 0.0;
    for _ in 0..w * h {
        let mut changed = false;
        for idx in 0..w * h {
            if !dist[idx].is_finite() {
                continue;
            }
            let p = Pixel::from_index(idx, w);
            for d in Direction::ALL {
                let (Some(q), Some(c)) = (p.neighbor(d, w, h), costs.link_cost(p, d)) else {
                    continue;
                };
                if dist[idx] + c < dist[q.index(w)] {
                    dist[q.index(w)] = dist[idx] + c;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    let mut search = PathSearch::new(costs, seed).expect("seed in bounds");
    search.run_to_completion(7);
    for idx in 0..w * h {
        let p = Pixel::from_index(idx, w);
        let got = search.parent_map().cost(p).expect("every pixel reachable");
        assert!((got - dist[idx]).abs() < 1e-4, "{p:?}: {got} vs {}", dist[idx]);

        let path = search.extract_path(p).expect("finalized");
        assert_eq!(path.first(), Some(&seed));
        assert_eq!(path.last(), Some(&p));
        assert!(path.windows(2).all(|s| s[0].chebyshev(s[1]) == 1));
    }
}
