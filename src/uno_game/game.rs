use super::card::{Card, Color, Face};
use super::deck::{Deck, STANDARD_DECK_SIZE};
use super::persistence::{MoveRecord, PersistenceError, PersistenceGateway, Snapshot};
use super::player::{random_color, Decision, Player};
use super::ui::Presenter;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const HAND_SIZE: usize = 7;
pub const MIN_PLAYERS: usize = 2;
/// Every hand plus the starting discard has to fit in one deck.
pub const MAX_PLAYERS: usize = (STANDARD_DECK_SIZE - 1) / HAND_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    RoundOver { winner: usize },
}

#[derive(Debug)]
pub enum GameError {
    CardNotInHand,
    InputClosed,
    DeckExhausted,
    InvalidStartingState,
    NotEnoughPlayers,
    TooManyPlayers,
    RoundOver,
    Persistence(PersistenceError),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::CardNotInHand => write!(f, "Card not in hand"),
            GameError::InputClosed => write!(f, "Input closed, game saved for later"),
            GameError::DeckExhausted => write!(f, "Deck is empty"),
            GameError::InvalidStartingState => {
                write!(f, "No non-wild starting card could be drawn")
            }
            GameError::NotEnoughPlayers => {
                write!(f, "At least {} players are required", MIN_PLAYERS)
            }
            GameError::TooManyPlayers => write!(f, "At most {} players can join", MAX_PLAYERS),
            GameError::RoundOver => write!(f, "Round is already over"),
            GameError::Persistence(e) => write!(f, "Persistence failure: {}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for GameError {
    fn from(e: PersistenceError) -> Self {
        GameError::Persistence(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted {
        top_card: Card,
    },
    CardDrawn {
        player: usize,
        card: Card,
    },
    CardPlayed {
        player: usize,
        card: Card,
    },
    ColorChosen {
        player: usize,
        color: Color,
    },
    PlayerSkipped {
        player: usize,
    },
    DirectionReversed {
        direction: Direction,
    },
    ForcedDraw {
        player: usize,
        cards: Vec<Card>,
    },
    Passed {
        player: usize,
    },
    DeckRecycled {
        cards: usize,
    },
    DeckExhausted {
        player: usize,
    },
    TurnAdvanced {
        player: usize,
    },
    PlayerWins {
        player: usize,
    },
}

/// Represents the direction of play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn reverse(&self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// +1 or -1, as stored in the game record.
    pub fn step(&self) -> i8 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    pub fn from_step(step: i8) -> Option<Self> {
        match step {
            1 => Some(Direction::Clockwise),
            -1 => Some(Direction::CounterClockwise),
            _ => None,
        }
    }
}

/// What happened during one call into the engine. Persistence failures are
/// reported here rather than aborting the round.
#[derive(Debug, Default)]
pub struct TurnReport {
    pub events: Vec<GameEvent>,
    pub persistence_errors: Vec<PersistenceError>,
}

impl TurnReport {
    fn note_persistence(&mut self, result: Result<(), PersistenceError>) {
        if let Err(e) = result {
            self.persistence_errors.push(e);
        }
    }
}

#[derive(Debug)]
pub struct GameEngine {
    pub game_id: Uuid,
    pub players: Vec<Player>,
    pub current_player: usize,
    pub direction: Direction,
    pub deck: Deck,
    pub top_card: Card,
    /// Cards buried under `top_card`, oldest first.
    pub discard_pile: Vec<Card>,
    pub status: GameStatus,
    pub(crate) rng: StdRng,
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draws the first discard, re-burying wild cards until a colored card
/// turns up. Gives up after one pass through the deck.
pub fn draw_starting_card(deck: &mut Deck) -> Result<Card, GameError> {
    for _ in 0..deck.len() {
        let card = deck.draw().ok_or(GameError::DeckExhausted)?;
        if !card.is_wild_family() {
            return Ok(card);
        }
        debug!("Re-burying {} drawn as starting card", card);
        deck.insert_at_bottom(card);
    }
    Err(GameError::InvalidStartingState)
}

fn deal_round(players: &mut [Player], rng: &mut StdRng) -> Result<(Deck, Card), GameError> {
    let mut deck = Deck::new(rng);
    let top_card = draw_starting_card(&mut deck)?;

    for player in players.iter_mut() {
        player.hand.clear();
    }
    for _ in 0..HAND_SIZE {
        for player in players.iter_mut() {
            if player.draw(&mut deck, 1).is_empty() {
                return Err(GameError::DeckExhausted);
            }
        }
    }
    Ok((deck, top_card))
}

impl GameEngine {
    pub fn new(mut players: Vec<Player>, mut rng: StdRng) -> Result<Self, GameError> {
        if players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        if players.len() > MAX_PLAYERS {
            return Err(GameError::TooManyPlayers);
        }

        let (deck, top_card) = deal_round(&mut players, &mut rng)?;
        let game_id = Uuid::new_v4();
        info!(
            "Started game {} with {} players, top card {}",
            game_id,
            players.len(),
            top_card
        );

        Ok(Self {
            game_id,
            players,
            current_player: 0,
            direction: Direction::Clockwise,
            deck,
            top_card,
            discard_pile: Vec::new(),
            status: GameStatus::InProgress,
            rng,
        })
    }

    pub fn active_player(&self) -> &Player {
        &self.players[self.current_player]
    }

    /// Updates the current turn based on the direction of play.
    pub fn next_turn(&mut self) {
        let num_players = self.players.len();
        match self.direction {
            Direction::Clockwise => {
                self.current_player = (self.current_player + 1) % num_players;
            }
            Direction::CounterClockwise => {
                self.current_player = (self.current_player + num_players - 1) % num_players;
            }
        }
    }

    /// Reverses the direction of play.
    pub fn reverse_direction(&mut self) {
        self.direction = self.direction.reverse();
    }

    /// Writes the current state to `store`. A failure is logged and handed
    /// back; the in-memory state stays authoritative.
    pub fn persist(&self, store: &mut dyn PersistenceGateway) -> Result<(), PersistenceError> {
        store.save(&Snapshot::capture(self)).map_err(|e| {
            error!("Failed to save game {}: {}", self.game_id, e);
            e
        })
    }

    /// Runs the active player's turn to completion and persists the result.
    pub fn play_turn(
        &mut self,
        presenter: &mut dyn Presenter,
        store: &mut dyn PersistenceGateway,
    ) -> Result<TurnReport, GameError> {
        if matches!(self.status, GameStatus::RoundOver { .. }) {
            return Err(GameError::RoundOver);
        }

        let index = self.current_player;
        let mut report = TurnReport::default();

        // One draw at most: a player without a move (or who declines) draws a
        // single card and gets one more chance to play before passing.
        let mut decision = self.decide(index, presenter)?;
        if decision == Decision::Decline {
            debug!("{} draws instead of playing", self.players[index].name);
            let deck = self.deck.clone();
            let discard_pile = self.discard_pile.clone();
            let hand_size = self.players[index].hand.len();
            for card in self.deal_to(index, 1, &mut report.events) {
                report.events.push(GameEvent::CardDrawn { player: index, card });
            }
            decision = match self.decide(index, presenter) {
                Ok(decision) => decision,
                Err(e) => {
                    // Undo the draw so a rejected answer leaves the table untouched.
                    self.deck = deck;
                    self.discard_pile = discard_pile;
                    self.players[index].hand.truncate(hand_size);
                    return Err(e);
                }
            };
        }

        match decision {
            Decision::Play(card) => self.resolve_play(index, card, presenter, store, &mut report)?,
            Decision::Decline => {
                report.events.push(GameEvent::Passed { player: index });
                self.end_turn(&mut report);
            }
        }

        let saved = self.persist(store);
        report.note_persistence(saved);
        Ok(report)
    }

    /// Deals a fresh round to the same players after a round is over.
    /// Win counters carry over.
    pub fn start_next_round(
        &mut self,
        store: &mut dyn PersistenceGateway,
    ) -> Result<TurnReport, GameError> {
        let (deck, top_card) = deal_round(&mut self.players, &mut self.rng)?;
        self.deck = deck;
        self.top_card = top_card;
        self.discard_pile.clear();
        self.direction = Direction::Clockwise;
        self.current_player = 0;
        self.status = GameStatus::InProgress;
        info!("New round in game {}, top card {}", self.game_id, top_card);

        let mut report = TurnReport::default();
        report.events.push(GameEvent::RoundStarted { top_card });
        let saved = self.persist(store);
        report.note_persistence(saved);
        Ok(report)
    }

    fn decide(
        &mut self,
        index: usize,
        presenter: &mut dyn Presenter,
    ) -> Result<Decision, GameError> {
        let player = &self.players[index];
        match player.choose_move(&self.top_card, &mut self.rng, presenter) {
            Decision::Play(card) if !player.hand.contains(&card) => {
                error!("{} chose {} which is not in their hand", player.name, card);
                Err(GameError::CardNotInHand)
            }
            Decision::Play(card) if !card.matches(&self.top_card) => {
                warn!(
                    "{} chose {} which cannot go on {}, treating as a decline",
                    player.name, card, self.top_card
                );
                Ok(Decision::Decline)
            }
            decision => Ok(decision),
        }
    }

    fn resolve_play(
        &mut self,
        index: usize,
        card: Card,
        presenter: &mut dyn Presenter,
        store: &mut dyn PersistenceGateway,
        report: &mut TurnReport,
    ) -> Result<(), GameError> {
        let mut card = self.players[index].play(&card)?;
        report.events.push(GameEvent::CardPlayed { player: index, card });
        let has_won = self.players[index].has_won();

        // The discard top must carry a real color before anything checks against it.
        if card.is_wild_family() {
            let color = if has_won {
                random_color(&mut self.rng)
            } else {
                self.players[index].choose_color(&mut self.rng, presenter)
            };
            card.color = color;
            report.events.push(GameEvent::ColorChosen { player: index, color });
        }

        let buried = std::mem::replace(&mut self.top_card, card);
        self.discard_pile.push(buried);
        debug!("{} played {}", self.players[index].name, card);

        let logged = store.record_move(&MoveRecord::new(self.game_id, index, &card));
        if let Err(e) = &logged {
            error!("Failed to record move in game {}: {}", self.game_id, e);
        }
        report.note_persistence(logged);

        if has_won {
            let winner = &mut self.players[index];
            winner.wins += 1;
            info!("{} wins the round ({} total)", winner.name, winner.wins);
            self.status = GameStatus::RoundOver { winner: index };
            report.events.push(GameEvent::PlayerWins { player: index });
            return Ok(());
        }

        match card.face {
            Face::Skip => self.skip_next(report),
            Face::Reverse => {
                self.reverse_direction();
                report.events.push(GameEvent::DirectionReversed {
                    direction: self.direction,
                });
                // Heads-up play: reversing hands the turn straight back.
                if self.players.len() == 2 {
                    self.skip_next(report);
                }
            }
            Face::DrawTwo => self.force_draw(2, report),
            Face::WildDrawFour => self.force_draw(4, report),
            Face::Number(_) | Face::Wild => {}
        }

        self.end_turn(report);
        Ok(())
    }

    fn skip_next(&mut self, report: &mut TurnReport) {
        self.next_turn();
        report.events.push(GameEvent::PlayerSkipped {
            player: self.current_player,
        });
    }

    /// The next player draws `count` cards and loses their turn.
    fn force_draw(&mut self, count: usize, report: &mut TurnReport) {
        self.next_turn();
        let victim = self.current_player;
        let cards = self.deal_to(victim, count, &mut report.events);
        report.events.push(GameEvent::ForcedDraw {
            player: victim,
            cards,
        });
    }

    fn end_turn(&mut self, report: &mut TurnReport) {
        self.next_turn();
        report.events.push(GameEvent::TurnAdvanced {
            player: self.current_player,
        });
    }

    /// Draws up to `count` cards for a player, recycling the discard pile
    /// when the deck runs dry.
    fn deal_to(&mut self, index: usize, count: usize, events: &mut Vec<GameEvent>) -> Vec<Card> {
        let mut drawn = Vec::with_capacity(count);
        while drawn.len() < count {
            if self.deck.is_empty() && !self.recycle_discard_pile(events) {
                warn!(
                    "Deck exhausted, {} drew {} of {} cards",
                    self.players[index].name,
                    drawn.len(),
                    count
                );
                events.push(GameEvent::DeckExhausted { player: index });
                break;
            }
            let wanted = count - drawn.len();
            drawn.extend(self.players[index].draw(&mut self.deck, wanted));
        }
        drawn
    }

    fn recycle_discard_pile(&mut self, events: &mut Vec<GameEvent>) -> bool {
        if self.discard_pile.is_empty() {
            return false;
        }
        let cards = self.discard_pile.len();
        self.deck
            .refill(self.discard_pile.drain(..).map(Card::unbound), &mut self.rng);
        info!("Shuffled {} discarded cards back into the deck", cards);
        events.push(GameEvent::DeckRecycled { cards });
        true
    }
}
