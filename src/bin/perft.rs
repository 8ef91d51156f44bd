use chess_rules::game::GameState;
use chess_rules::perft::{perft_divide, perft_stats};
use chess_rules::piece::Color;
use chess_rules::square_name;
use tracing_subscriber::EnvFilter;

/// `perft [depth] [placement] [w|b]`
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let depth = match args.first().map(|s| s.parse::<u32>()) {
        None => 3,
        Some(Ok(d)) if d > 0 => d,
        _ => {
            eprintln!("usage: perft [depth>0] [placement] [w|b]");
            std::process::exit(2);
        }
    };
    let side = match args.get(2).map(String::as_str) {
        Some("b") => Color::Black,
        _ => Color::White,
    };
    let state = match args.get(1) {
        Some(placement) => GameState::from_placement(placement, side),
        None => Ok(GameState::new()),
    };
    let mut state = match state {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    println!("{}\n", state.board());
    for (mv, nodes) in perft_divide(&mut state, depth) {
        println!("{}{} {mv}: {nodes}", square_name(mv.from), square_name(mv.to));
    }
    let stats = perft_stats(&mut state, depth);
    println!("\n{stats:?}");
}
