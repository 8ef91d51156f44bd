use crate::game::GameState;
use crate::moves::Move;

/// Count legal move leaf nodes to a given depth.
/// perft(state, 0) = 1; for d>0, sum perft(child, d-1) over all legal moves.
pub fn perft(state: &mut GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = state.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for mv in moves {
        let mut probe = state.probe(mv);
        nodes += perft(probe.state_mut(), depth - 1);
    }
    nodes
}

/// Each legal root move with its leaf count at depth-1. Empty for depth 0.
pub fn perft_divide(state: &mut GameState, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let moves = state.legal_moves();
    moves
        .into_iter()
        .map(|mv| {
            let mut probe = state.probe(mv);
            (mv, perft(probe.state_mut(), depth - 1))
        })
        .collect()
}

/// Aggregate counters for perft diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PerftStats {
    pub nodes: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
}

impl PerftStats {
    fn add(&mut self, other: PerftStats) {
        self.nodes += other.nodes;
        self.captures += other.captures;
        self.en_passants += other.en_passants;
        self.castles += other.castles;
        self.promotions += other.promotions;
        self.checks += other.checks;
    }
}

/// Perft with a breakdown of the moves played at the final ply.
pub fn perft_stats(state: &mut GameState, depth: u32) -> PerftStats {
    let mut stats = PerftStats::default();
    if depth == 0 {
        stats.nodes = 1;
        return stats;
    }
    let side = state.side_to_move();
    for mv in state.legal_moves() {
        let mut probe = state.probe(mv);
        if depth > 1 {
            stats.add(perft_stats(probe.state_mut(), depth - 1));
            continue;
        }
        stats.nodes += 1;
        stats.captures += mv.is_capture() as u64;
        stats.en_passants += mv.is_en_passant as u64;
        stats.castles += mv.is_castling as u64;
        stats.promotions += mv.is_promotion as u64;
        stats.checks += probe.in_check(side.opposite()) as u64;
    }
    stats
}
