use crate::game::Encoding;
use crate::mcts::Candidate;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// the experience-store record for one game: who won, and the encoded
/// state before every move plus the final position. one UTF-8 JSON file
/// per game, nested-list tensors, exactly what the learner consumes.
#[derive(Debug, Default, Serialize)]
pub struct Trajectory {
    pub player_won: Option<usize>,
    pub states: Vec<Encoding>,
}

/// the adjacent human-readable log: the state dictionary, the move taken,
/// and the top candidates the search considered, move by move
#[derive(Debug, Default, Serialize)]
pub struct GameLog {
    pub player_won: Option<usize>,
    pub game: Vec<Ply>,
}

#[derive(Debug, Serialize)]
pub struct Ply {
    pub game_state: serde_json::Value,
    pub move_id: u32,
    pub r#move: serde_json::Value,
    pub top_moves: Vec<Candidate>,
}

/// timestamped file name shared by a game's trajectory and log
pub fn game_name() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow");
    format!("game_{}_{:09}.json", now.as_secs(), now.subsec_nanos())
}

pub fn save<T: Serialize>(record: &T, dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(record)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::game::State;

    #[test]
    fn trajectory_serializes_to_nested_lists() {
        let config = GameConfig::two_player();
        let state = State::new(&config);
        let trajectory = Trajectory {
            player_won: Some(1),
            states: vec![Encoding::from((&state, &config))],
        };
        let json = serde_json::to_value(&trajectory).unwrap();
        assert!(json["player_won"] == 1);
        assert!(json["states"][0].as_array().unwrap().len() == 59);
        assert!(json["states"][0][0].as_array().unwrap().len() == 21);
    }

    #[test]
    fn save_writes_utf8_json() {
        let dir = std::env::temp_dir().join("ludozero-trajectory-test");
        let path = save(&GameLog::default(), &dir, "game_test.json").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_ok());
        std::fs::remove_file(path).unwrap();
    }
}
