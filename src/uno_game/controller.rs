use super::game::{rng_from_seed, GameEngine, GameError, GameStatus, TurnReport};
use super::persistence::{PersistenceError, PersistenceGateway};
use super::player::Player;
use super::ui::ConsoleUI;
use log::{info, warn};

pub struct GameController<S: PersistenceGateway> {
    pub game: GameEngine,
    pub store: S,
    ui: ConsoleUI,
}

impl<S: PersistenceGateway> GameController<S> {
    /// Picks up the saved game in `store` unless `fresh` is set. Without a
    /// usable snapshot a new game is dealt, asking for names when fewer than
    /// two players were supplied.
    pub fn resume_or_new(
        mut players: Vec<Player>,
        mut store: S,
        mut ui: ConsoleUI,
        seed: Option<u64>,
        fresh: bool,
    ) -> Result<Self, GameError> {
        if !fresh {
            match store.load().and_then(|snapshot| snapshot.restore(rng_from_seed(seed))) {
                Ok(game) => {
                    info!("Resuming game {}", game.game_id);
                    ui.notice(format!(
                        "Resuming saved game with {}",
                        game.players
                            .iter()
                            .map(|p| p.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                    return Ok(Self { game, store, ui });
                }
                Err(PersistenceError::NotFound) => info!("No saved game, starting a new one"),
                Err(e) => {
                    warn!("Ignoring unusable saved game: {}", e);
                    ui.notice(format!("Saved game could not be loaded ({}), starting over.", e));
                }
            }
        }

        if players.len() < 2 {
            players = ui.get_player_names(players);
        }
        let game = GameEngine::new(players, rng_from_seed(seed))?;
        let mut controller = Self { game, store, ui };
        if let Err(e) = controller.game.persist(&mut controller.store) {
            controller.ui.report_persistence_error(&e);
        }
        Ok(controller)
    }

    /// Plays until `rounds` more rounds have been won.
    pub fn run(&mut self, rounds: u32) -> Result<(), GameError> {
        self.ui.notice("Welcome to Uno!");

        // A round that ended just before the last shutdown still needs its reset.
        if matches!(self.game.status, GameStatus::RoundOver { .. }) {
            let report = self.game.start_next_round(&mut self.store)?;
            self.show(&report);
        }

        let mut completed = 0;
        while completed < rounds {
            self.ui.display_game_state(&self.game);
            let report = self.game.play_turn(&mut self.ui, &mut self.store)?;
            self.show(&report);
            // The turn above is already saved, so the game can resume later.
            if self.ui.input_closed() {
                warn!("Console input closed, stopping");
                return Err(GameError::InputClosed);
            }

            if let GameStatus::RoundOver { winner } = self.game.status {
                self.ui.announce_winner(&self.game, winner);
                completed += 1;
                if completed < rounds {
                    let report = self.game.start_next_round(&mut self.store)?;
                    self.show(&report);
                }
            }
        }
        Ok(())
    }

    fn show(&mut self, report: &TurnReport) {
        for event in &report.events {
            self.ui.handle_game_event(event, &self.game);
        }
        for error in &report.persistence_errors {
            self.ui.report_persistence_error(error);
        }
    }
}
