//! Lichen connectivity, watering, and decay.
//!
//! A factory's lichen region is found by breadth-first search from its
//! footprint through tiles of its own strain. Growth only spreads out of
//! tiles holding at least `MIN_LICHEN_TO_SPREAD`; the footprint itself
//! always spreads.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::board::factory::footprint_of;
use crate::board::{Board, Factory, FactoryId, Position};
use crate::config::EnvConfig;

/// Tiles of `factory`'s strain reachable from its footprint.
pub fn connected_lichen(board: &Board, factory: &Factory) -> Vec<Position> {
    let fid = factory.factory_id;
    search(board, factory, |p| {
        let i = board.index(p);
        (board.lichen_strains[i] == Some(fid) && board.lichen[i] > 0).then_some(true)
    })
}

/// Tiles a water action by `factory` would feed: its connected lichen plus
/// empty tiles bordering the footprint or a tile ripe enough to spread.
pub fn grow_set(board: &Board, factories: &BTreeMap<FactoryId, Factory>, factory: &Factory, min_to_spread: i32) -> Vec<Position> {
    let fid = factory.factory_id;
    search(board, factory, |p| {
        let i = board.index(p);
        match board.lichen_strains[i] {
            Some(s) if s == fid && board.lichen[i] > 0 => Some(board.lichen[i] >= min_to_spread),
            Some(_) => None,
            None => {
                let open = board.lichen[i] == 0
                    && board.rubble[i] == 0
                    && !board.ice[i]
                    && !board.ore[i]
                    && !factories.values().any(|f| f.covers(p));
                open.then_some(false)
            }
        }
    })
}

/// Breadth-first search outward from the footprint.
///
/// `visit` returns `None` to exclude a tile, `Some(expand)` to include it and
/// say whether the search continues through it.
fn search(board: &Board, factory: &Factory, visit: impl Fn(Position) -> Option<bool>) -> Vec<Position> {
    let mut seen: HashSet<Position> = footprint_of(factory.pos).collect();
    let mut queue: VecDeque<Position> = footprint_of(factory.pos)
        .flat_map(|p| p.neighbors())
        .collect();
    let mut found = Vec::new();

    while let Some(p) = queue.pop_front() {
        if !board.contains(p) || !seen.insert(p) {
            continue;
        }
        let Some(expand) = visit(p) else {
            continue;
        };
        found.push(p);
        if expand {
            queue.extend(p.neighbors());
        }
    }
    found
}

/// Water needed to feed `tiles` tiles; never less than one.
pub fn watering_cost(tiles: usize, cost_factor: i32) -> i32 {
    let factor = cost_factor.max(1) as usize;
    (tiles.div_ceil(factor) as i32).max(1)
}

/// Pays for and applies every factory's water action, then decays all
/// lichen that was not watered. Returns the ids of factories that watered.
pub fn water_and_decay(
    board: &mut Board,
    factories: &mut BTreeMap<FactoryId, Factory>,
    waterers: &[FactoryId],
    cfg: &EnvConfig,
) -> Vec<FactoryId> {
    let mut claims: Vec<(FactoryId, Vec<Position>)> = Vec::new();
    for &fid in waterers {
        let Some(factory) = factories.get(&fid) else {
            continue;
        };
        let tiles = grow_set(board, factories, factory, cfg.min_lichen_to_spread);
        let cost = watering_cost(tiles.len(), cfg.lichen_watering_cost_factor);
        if let Some(factory) = factories.get_mut(&fid) {
            if factory.cargo.water < cost {
                tracing::trace!(target: "resolve.lichen", factory = fid, cost, "cannot afford watering");
                continue;
            }
            factory.cargo.water -= cost;
        }
        claims.push((fid, tiles));
    }

    // A fresh tile claimed by two factories in one turn stays empty.
    let mut claim_count: BTreeMap<Position, usize> = BTreeMap::new();
    for (_, tiles) in &claims {
        for &p in tiles {
            if board.strain_at(p).is_none() {
                *claim_count.entry(p).or_insert(0) += 1;
            }
        }
    }

    let mut watered = vec![false; board.lichen.len()];
    for (fid, tiles) in &claims {
        for &p in tiles {
            if claim_count.get(&p).is_some_and(|&c| c > 1) {
                continue;
            }
            let i = board.index(p);
            board.lichen[i] = (board.lichen[i] + cfg.lichen_gained_with_water).min(cfg.max_lichen_per_tile);
            board.lichen_strains[i] = Some(*fid);
            watered[i] = true;
        }
    }

    for i in 0..board.lichen.len() {
        if watered[i] || board.lichen[i] == 0 {
            continue;
        }
        board.lichen[i] = (board.lichen[i] - cfg.lichen_lost_without_water).max(0);
        if board.lichen[i] == 0 {
            board.lichen_strains[i] = None;
        }
    }

    claims.into_iter().map(|(fid, _)| fid).collect()
}
