pub mod card;
pub mod controller;
pub mod deck;
pub mod game;
pub mod persistence;
pub mod player;
pub mod ui;

pub use card::{Card, Color, Face};
pub use controller::GameController;
pub use deck::Deck;
pub use game::{Direction, GameEngine, GameError, GameEvent, GameStatus, TurnReport};
pub use persistence::{JsonFileStore, MemoryStore, PersistenceError, PersistenceGateway, Snapshot};
pub use player::{Decision, Player, Strategy};
pub use ui::{ConsoleUI, Presenter};
