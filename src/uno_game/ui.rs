use super::card::{Card, Color};
use super::game::{GameEngine, GameEvent};
use super::persistence::PersistenceError;
use super::player::{Decision, Player, Strategy};
use log::debug;
use std::fmt::Display;
use std::io::{self, BufRead, BufReader, Write};

/// The prompts the engine needs answered for human players. Anything that
/// is not a member of the offered set counts as a decline.
pub trait Presenter {
    fn choose_card(&mut self, player: &Player, top_card: &Card, legal: &[Card]) -> Decision;

    fn choose_color(&mut self, player: &Player) -> Option<Color>;
}

pub struct ConsoleUI {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    input_closed: bool,
}

impl Default for ConsoleUI {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleUI {
    pub fn new() -> Self {
        Self {
            input: Box::new(BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
            input_closed: false,
        }
    }

    pub fn with_streams(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self {
            input,
            output,
            input_closed: false,
        }
    }

    /// True once a prompt hit end of input or a read error.
    pub fn input_closed(&self) -> bool {
        self.input_closed
    }

    fn say(&mut self, line: impl Display) {
        if let Err(e) = writeln!(self.output, "{}", line) {
            debug!("Console write failed: {}", e);
        }
    }

    /// Prints `prompt` and reads one trimmed line. `None` on end of input.
    fn ask(&mut self, prompt: &str) -> Option<String> {
        let written = write!(self.output, "{}", prompt).and_then(|_| self.output.flush());
        if let Err(e) = written {
            debug!("Console write failed: {}", e);
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                self.input_closed = true;
                None
            }
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                debug!("Console read failed: {}", e);
                self.input_closed = true;
                None
            }
        }
    }

    /// Adds players by name to `players` until '.' is entered. A player
    /// named "AI" is played by the computer.
    pub fn get_player_names(&mut self, mut players: Vec<Player>) -> Vec<Player> {
        for player in &players {
            self.say(format!("Already seated: {}", player.name));
        }
        loop {
            let Some(name) = self.ask("Enter player name (or '.' to finish): ") else {
                break;
            };

            if name == "." {
                if players.len() < 2 {
                    self.say("You need at least 2 players to start the game.");
                    continue;
                }
                break;
            }
            if name.is_empty() {
                continue;
            }

            if name == "AI" {
                players.push(Player::rule_based(name));
            } else {
                players.push(Player::human(name));
            }
        }
        players
    }

    pub fn display_game_state(&mut self, game: &GameEngine) {
        self.say("\n--- Game State ---");
        self.say(format!("Direction: {:?}", game.direction));
        self.say(format!("Discard Pile Top Card: {}", game.top_card));
        self.say(format!("Deck Cards Remaining: {}", game.deck.len()));
        self.say(format!("Turn: {}", game.active_player().name));
        for (i, player) in game.players.iter().enumerate() {
            let marker = if i == game.current_player { ">" } else { " " };
            self.say(format!(
                "{} {} ({} cards, {} wins)",
                marker,
                player.name,
                player.hand.len(),
                player.wins
            ));
        }
    }

    pub fn display_player_hand(&mut self, player: &Player) {
        self.say(format!("\nPlayer {}'s hand:", player.name));
        let cards = player
            .hand
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.say(cards);
    }

    pub fn handle_game_event(&mut self, event: &GameEvent, game: &GameEngine) {
        let name = |index: usize| game.players[index].name.clone();
        let line = match event {
            GameEvent::RoundStarted { top_card } => {
                format!("New round! Starting card: {}", top_card)
            }
            GameEvent::CardDrawn { player, card } => {
                if game.players[*player].strategy == Strategy::Human {
                    format!("Player {} drew {}", name(*player), card)
                } else {
                    format!("Player {} drew a card", name(*player))
                }
            }
            GameEvent::CardPlayed { player, card } => {
                format!("Player {} played {}", name(*player), card)
            }
            GameEvent::ColorChosen { player, color } => {
                format!("Player {} chose color {}", name(*player), color)
            }
            GameEvent::PlayerSkipped { player } => {
                format!("Player {} is skipped!", name(*player))
            }
            GameEvent::DirectionReversed { direction } => {
                format!("Direction reversed! Now {:?}", direction)
            }
            GameEvent::ForcedDraw { player, cards } => {
                format!("Player {} draws {} cards!", name(*player), cards.len())
            }
            GameEvent::Passed { player } => format!("Player {} passes", name(*player)),
            GameEvent::DeckRecycled { cards } => {
                format!("Deck empty, {} discarded cards shuffled back in", cards)
            }
            GameEvent::DeckExhausted { player } => {
                format!("No cards left to draw for {}", name(*player))
            }
            GameEvent::TurnAdvanced { player } => format!("Next up: {}", name(*player)),
            GameEvent::PlayerWins { player } => {
                format!("Player {} has won the round!", name(*player))
            }
        };
        self.say(line);
    }

    pub fn announce_winner(&mut self, game: &GameEngine, winner: usize) {
        self.say(format!(
            "\n*** {} wins this round! ***",
            game.players[winner].name
        ));
        self.say("Wins so far:");
        for player in &game.players {
            self.say(format!("  {}: {}", player.name, player.wins));
        }
    }

    pub fn report_persistence_error(&mut self, error: &PersistenceError) {
        self.say(format!("Warning: progress could not be saved ({}).", error));
        self.say("The game continues, but cannot be resumed from this point.");
    }

    pub fn notice(&mut self, message: impl Display) {
        self.say(message);
    }
}

impl Presenter for ConsoleUI {
    fn choose_card(&mut self, player: &Player, top_card: &Card, legal: &[Card]) -> Decision {
        self.display_player_hand(player);
        self.say(format!("Cards you can play on {}:", top_card));
        for (i, card) in legal.iter().enumerate() {
            self.say(format!("{}. {}", i, card));
        }

        let Some(answer) = self.ask("Enter the index of the card to play (blank to draw): ") else {
            return Decision::Decline;
        };
        match answer.parse::<usize>().ok().and_then(|i| legal.get(i)) {
            Some(card) => Decision::Play(*card),
            None => Decision::Decline,
        }
    }

    fn choose_color(&mut self, player: &Player) -> Option<Color> {
        self.say(format!("{}, choose a color:", player.name));
        for (i, color) in Color::BASE.iter().enumerate() {
            self.say(format!("{}. {}", i + 1, color));
        }

        let answer = self.ask("Enter your choice: ")?;
        if let Ok(n) = answer.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Color::BASE.get(i)).copied();
        }
        answer
            .parse::<Color>()
            .ok()
            .filter(|color| *color != Color::Wild)
    }
}
