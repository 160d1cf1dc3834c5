use super::card::{Card, Color, Face, ParseCardError};
use super::deck::Deck;
use super::game::{Direction, GameEngine, GameStatus, MIN_PLAYERS};
use super::player::{Player, Strategy};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

const SNAPSHOT_FILE: &str = "active_game.json";
const MOVE_LOG_FILE: &str = "moves.jsonl";

#[derive(Debug)]
pub enum PersistenceError {
    NotFound,
    Io(io::Error),
    Serialization(serde_json::Error),
    Corrupt(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::NotFound => write!(f, "No saved game found"),
            PersistenceError::Io(e) => write!(f, "I/O error: {}", e),
            PersistenceError::Serialization(e) => write!(f, "Serialization error: {}", e),
            PersistenceError::Corrupt(msg) => write!(f, "Saved game is corrupt: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistenceError {
    fn from(e: io::Error) -> Self {
        PersistenceError::Io(e)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Serialization(e)
    }
}

impl From<ParseCardError> for PersistenceError {
    fn from(e: ParseCardError) -> Self {
        PersistenceError::Corrupt(e.to_string())
    }
}

/// Durable storage for the single active game.
pub trait PersistenceGateway {
    /// Replaces the stored snapshot as a whole.
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError>;

    fn load(&self) -> Result<Snapshot, PersistenceError>;

    /// Appends to the audit log. Never touched by `save`.
    fn record_move(&mut self, entry: &MoveRecord) -> Result<(), PersistenceError>;

    fn move_log(&self) -> Result<Vec<MoveRecord>, PersistenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardLocation {
    Deck,
    Discard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub current_player: usize,
    pub direction: i8,
    pub top_card_color: Color,
    pub top_card_face: Face,
    pub winner: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    /// Comma separated `color:face` pairs.
    pub hand: String,
    pub strategy: Strategy,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub color: Color,
    pub face: Face,
    pub location: CardLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub game_id: Uuid,
    pub player_index: usize,
    pub card_color: Color,
    pub card_face: Face,
    pub timestamp: DateTime<Utc>,
}

impl MoveRecord {
    pub fn new(game_id: Uuid, player_index: usize, card: &Card) -> Self {
        Self {
            game_id,
            player_index,
            card_color: card.color,
            card_face: card.face,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub game_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub game: GameRecord,
    pub players: Vec<PlayerRecord>,
    /// Deck cards bottom to top, followed by the buried discard pile.
    pub cards: Vec<CardRecord>,
}

pub fn encode_hand(hand: &[Card]) -> String {
    hand.iter()
        .map(Card::to_record)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn decode_hand(encoded: &str) -> Result<Vec<Card>, ParseCardError> {
    if encoded.trim().is_empty() {
        return Ok(Vec::new());
    }
    encoded.split(',').map(|card| card.parse::<Card>()).collect()
}

impl Snapshot {
    pub fn capture(engine: &GameEngine) -> Self {
        let winner = match engine.status {
            GameStatus::RoundOver { winner } => Some(winner),
            GameStatus::InProgress => None,
        };

        let players = engine
            .players
            .iter()
            .map(|player| PlayerRecord {
                name: player.name.clone(),
                hand: encode_hand(&player.hand),
                strategy: player.strategy,
                wins: player.wins,
            })
            .collect();

        let deck = engine.deck.cards().iter().map(|card| (card, CardLocation::Deck));
        let discard = engine
            .discard_pile
            .iter()
            .map(|card| (card, CardLocation::Discard));
        let cards = deck
            .chain(discard)
            .map(|(card, location)| CardRecord {
                color: card.color,
                face: card.face,
                location,
            })
            .collect();

        Self {
            game_id: engine.game_id,
            saved_at: Utc::now(),
            game: GameRecord {
                current_player: engine.current_player,
                direction: engine.direction.step(),
                top_card_color: engine.top_card.color,
                top_card_face: engine.top_card.face,
                winner,
            },
            players,
            cards,
        }
    }

    /// Rebuilds the engine this snapshot was taken from.
    pub fn restore(&self, rng: StdRng) -> Result<GameEngine, PersistenceError> {
        if self.players.len() < MIN_PLAYERS {
            return Err(PersistenceError::Corrupt(format!(
                "{} players stored",
                self.players.len()
            )));
        }
        if self.game.current_player >= self.players.len() {
            return Err(PersistenceError::Corrupt(format!(
                "current player {} out of range",
                self.game.current_player
            )));
        }
        let direction = Direction::from_step(self.game.direction).ok_or_else(|| {
            PersistenceError::Corrupt(format!("direction {}", self.game.direction))
        })?;
        let top_card = Card::new(self.game.top_card_color, self.game.top_card_face);
        if top_card.color == Color::Wild {
            return Err(PersistenceError::Corrupt(format!(
                "discard top {} has no color",
                top_card
            )));
        }
        let status = match self.game.winner {
            Some(winner) if winner < self.players.len() => GameStatus::RoundOver { winner },
            Some(winner) => {
                return Err(PersistenceError::Corrupt(format!(
                    "winner {} out of range",
                    winner
                )))
            }
            None => GameStatus::InProgress,
        };

        let players = self
            .players
            .iter()
            .map(|record| -> Result<Player, PersistenceError> {
                let mut player = Player::new(record.name.clone(), record.strategy);
                player.hand = decode_hand(&record.hand)?;
                player.wins = record.wins;
                Ok(player)
            })
            .collect::<Result<Vec<_>, PersistenceError>>()?;

        let mut deck = Vec::new();
        let mut discard_pile = Vec::new();
        for record in &self.cards {
            let card = Card::new(record.color, record.face);
            match record.location {
                CardLocation::Deck => deck.push(card),
                CardLocation::Discard => discard_pile.push(card),
            }
        }

        Ok(GameEngine {
            game_id: self.game_id,
            players,
            current_player: self.game.current_player,
            direction,
            deck: Deck::from_cards(deck),
            top_card,
            discard_pile,
            status,
            rng,
        })
    }
}

/// Keeps the active game as a JSON file inside a state directory, next to
/// an append-only JSON lines move log.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    pub state_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let state_dir = state_dir.into();
        fs::create_dir_all(&state_dir)?;
        Ok(Self { state_dir })
    }

    fn snapshot_path(&self) -> PathBuf {
        self.state_dir.join(SNAPSHOT_FILE)
    }

    fn move_log_path(&self) -> PathBuf {
        self.state_dir.join(MOVE_LOG_FILE)
    }
}

impl PersistenceGateway for JsonFileStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let path = self.snapshot_path();
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        // rename replaces the old snapshot in one step
        fs::rename(&staging, &path)?;
        debug!("Saved game {} to {}", snapshot.game_id, path.display());
        Ok(())
    }

    fn load(&self) -> Result<Snapshot, PersistenceError> {
        let path = self.snapshot_path();
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(PersistenceError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        info!("Loaded game {} saved at {}", snapshot.game_id, snapshot.saved_at);
        Ok(snapshot)
    }

    fn record_move(&mut self, entry: &MoveRecord) -> Result<(), PersistenceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.move_log_path())?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;
        Ok(())
    }

    fn move_log(&self) -> Result<Vec<MoveRecord>, PersistenceError> {
        let log = match fs::read_to_string(self.move_log_path()) {
            Ok(log) => log,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        log.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(PersistenceError::from))
            .collect()
    }
}

/// In-process store. `fail_writes` makes every write report an I/O error.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub snapshot: Option<Snapshot>,
    pub moves: Vec<MoveRecord>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes {
            return Err(io::Error::other("store is not writable").into());
        }
        Ok(())
    }
}

impl PersistenceGateway for MemoryStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Snapshot, PersistenceError> {
        self.snapshot.clone().ok_or(PersistenceError::NotFound)
    }

    fn record_move(&mut self, entry: &MoveRecord) -> Result<(), PersistenceError> {
        self.check_writable()?;
        self.moves.push(entry.clone());
        Ok(())
    }

    fn move_log(&self) -> Result<Vec<MoveRecord>, PersistenceError> {
        Ok(self.moves.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uno_game::game::rng_from_seed;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn new_game() -> GameEngine {
        let players = vec![Player::human("Alice"), Player::rule_based("AI")];
        GameEngine::new(players, StdRng::seed_from_u64(3)).unwrap()
    }

    fn counts(cards: &[Card]) -> HashMap<Card, usize> {
        let mut counts = HashMap::new();
        for card in cards {
            *counts.entry(*card).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_hand_encoding() {
        let hand = vec![
            Card::new(Color::Red, Face::Number(5)),
            Card::new(Color::Wild, Face::WildDrawFour),
        ];
        let encoded = encode_hand(&hand);
        assert_eq!(encoded, "Red:5,Wild:WildDrawFour");
        assert_eq!(decode_hand(&encoded).unwrap(), hand);
        assert!(decode_hand("").unwrap().is_empty());
        assert!(decode_hand("Red:5,oops").is_err());
    }

    #[test]
    fn test_save_then_load_restores_state() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();
        let mut game = new_game();
        game.current_player = 1;
        game.direction = Direction::CounterClockwise;
        game.top_card = Card::new(Color::Blue, Face::Wild);
        game.discard_pile = vec![Card::new(Color::Green, Face::Number(4))];
        game.players[1].wins = 3;

        game.persist(&mut store).unwrap();
        let restored = store.load().unwrap().restore(rng_from_seed(Some(9))).unwrap();

        assert_eq!(restored.game_id, game.game_id);
        assert_eq!(restored.current_player, 1);
        assert_eq!(restored.direction, Direction::CounterClockwise);
        assert_eq!(restored.top_card, Card::new(Color::Blue, Face::Wild));
        assert_eq!(restored.discard_pile, game.discard_pile);
        assert_eq!(restored.status, GameStatus::InProgress);
        assert_eq!(restored.deck.len(), game.deck.len());
        assert_eq!(counts(restored.deck.cards()), counts(game.deck.cards()));
        for (restored, original) in restored.players.iter().zip(&game.players) {
            assert_eq!(restored.name, original.name);
            assert_eq!(restored.strategy, original.strategy);
            assert_eq!(restored.wins, original.wins);
            assert_eq!(counts(&restored.hand), counts(&original.hand));
        }
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();
        let mut game = new_game();

        game.persist(&mut store).unwrap();
        game.current_player = 1;
        game.persist(&mut store).unwrap();

        assert_eq!(store.load().unwrap().game.current_player, 1);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from(SNAPSHOT_FILE)]);
    }

    #[test]
    fn test_load_without_save_is_not_found() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested")).unwrap();
        assert!(matches!(store.load(), Err(PersistenceError::NotFound)));
        assert!(store.move_log().unwrap().is_empty());
    }

    #[test]
    fn test_move_log_survives_saves() {
        let dir = tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path()).unwrap();
        let game = new_game();
        let card = Card::new(Color::Red, Face::Skip);

        store.record_move(&MoveRecord::new(game.game_id, 0, &card)).unwrap();
        game.persist(&mut store).unwrap();
        store.record_move(&MoveRecord::new(game.game_id, 1, &card)).unwrap();
        game.persist(&mut store).unwrap();

        let log = store.move_log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].player_index, 0);
        assert_eq!(log[1].player_index, 1);
        assert_eq!(log[1].card_face, Face::Skip);
        assert!(log[0].timestamp <= log[1].timestamp);
    }

    #[test]
    fn test_garbage_snapshot_is_reported() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        fs::write(dir.path().join(SNAPSHOT_FILE), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(PersistenceError::Serialization(_))));
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshot() {
        let game = new_game();

        let mut snapshot = Snapshot::capture(&game);
        snapshot.game.current_player = 5;
        assert!(matches!(
            snapshot.restore(rng_from_seed(Some(1))),
            Err(PersistenceError::Corrupt(_))
        ));

        let mut snapshot = Snapshot::capture(&game);
        snapshot.game.top_card_color = Color::Wild;
        snapshot.game.top_card_face = Face::Wild;
        assert!(matches!(
            snapshot.restore(rng_from_seed(Some(1))),
            Err(PersistenceError::Corrupt(_))
        ));

        let mut snapshot = Snapshot::capture(&game);
        snapshot.players[0].hand = "Red:11".to_string();
        assert!(matches!(
            snapshot.restore(rng_from_seed(Some(1))),
            Err(PersistenceError::Corrupt(_))
        ));
    }

    #[test]
    fn test_round_over_survives_restore() {
        let mut game = new_game();
        game.status = GameStatus::RoundOver { winner: 1 };

        let restored = Snapshot::capture(&game)
            .restore(rng_from_seed(Some(1)))
            .unwrap();
        assert_eq!(restored.status, GameStatus::RoundOver { winner: 1 });
    }

    #[test]
    fn test_memory_store_failure_mode() {
        let game = new_game();
        let mut store = MemoryStore::failing();

        assert!(matches!(game.persist(&mut store), Err(PersistenceError::Io(_))));
        assert!(matches!(store.load(), Err(PersistenceError::NotFound)));
    }
}
