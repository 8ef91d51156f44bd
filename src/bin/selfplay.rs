use chess_rules::game::{GameState, GameStatus};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Random legal play-outs from the start position.
#[derive(Debug)]
struct PlayoutConfig {
    games: usize,
    max_plies: usize,
    seed: u64,
    json: bool,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        PlayoutConfig {
            games: 1,
            max_plies: 200,
            seed: 0,
            json: false,
        }
    }
}

impl PlayoutConfig {
    /// `selfplay [games] [max_plies] [seed] [--json]`
    fn from_args() -> Result<Self, String> {
        let mut config = PlayoutConfig::default();
        let mut positional = Vec::new();
        for arg in std::env::args().skip(1) {
            if arg == "--json" {
                config.json = true;
            } else {
                positional.push(arg);
            }
        }
        let parse = |s: &str| s.parse::<u64>().map_err(|e| format!("{s:?}: {e}"));
        if let Some(s) = positional.first() {
            config.games = parse(s)? as usize;
        }
        if let Some(s) = positional.get(1) {
            config.max_plies = parse(s)? as usize;
        }
        if let Some(s) = positional.get(2) {
            config.seed = parse(s)?;
        }
        Ok(config)
    }
}

fn play_game(rng: &mut StdRng, max_plies: usize) -> GameState {
    let mut state = GameState::new();
    for _ in 0..max_plies {
        let moves = state.legal_moves();
        let Some(&mv) = moves.choose(rng) else {
            break;
        };
        if let Err(e) = state.try_move(mv.from, mv.to) {
            panic!("generated move {mv} rejected: {e}");
        }
    }
    state
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match PlayoutConfig::from_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("usage: selfplay [games] [max_plies] [seed] [--json]\n{e}");
            std::process::exit(2);
        }
    };
    info!(?config, "starting");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut mates = 0;
    let mut stalemates = 0;

    for game in 0..config.games {
        let mut state = play_game(&mut rng, config.max_plies);
        let status = state.status();
        match status {
            GameStatus::Checkmate => mates += 1,
            GameStatus::Stalemate => stalemates += 1,
            _ => {}
        }

        if config.json {
            match serde_json::to_string(&state.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("game {game}: {e}"),
            }
        } else {
            println!("game {game}: {status:?}");
            println!("{}", state.notation_log());
            println!("{}\n", state.board());
        }

        let plies = state.history().count();
        while state.undo_move().is_some() {}
        if !state.is_start_position() {
            panic!("game {game}: undoing {plies} plies did not restore the start position");
        }
    }

    eprintln!(
        "{} games: {mates} checkmates, {stalemates} stalemates",
        config.games
    );
}
