use super::card::{Card, Color, Face};
use super::deck::Deck;
use super::game::GameError;
use super::ui::Presenter;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Moves are picked through the presentation layer.
    Human,
    RuleBased,
}

/// Outcome of asking a player for a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Play(Card),
    Decline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub hand: Vec<Card>,
    pub strategy: Strategy,
    pub wins: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            hand: Vec::new(),
            strategy,
            wins: 0,
        }
    }

    pub fn human(name: impl Into<String>) -> Self {
        Self::new(name, Strategy::Human)
    }

    pub fn rule_based(name: impl Into<String>) -> Self {
        Self::new(name, Strategy::RuleBased)
    }

    /// Draws up to `n` cards, stopping early if the deck runs out.
    /// Returns the cards that were drawn.
    pub fn draw(&mut self, deck: &mut Deck, n: usize) -> Vec<Card> {
        let mut drawn = Vec::with_capacity(n);
        for _ in 0..n {
            match deck.draw() {
                Some(card) => {
                    self.hand.push(card);
                    drawn.push(card);
                }
                None => break,
            }
        }
        drawn
    }

    /// Removes one copy of `card` from the hand.
    pub fn play(&mut self, card: &Card) -> Result<Card, GameError> {
        let index = self
            .hand
            .iter()
            .position(|held| held == card)
            .ok_or(GameError::CardNotInHand)?;
        Ok(self.hand.remove(index))
    }

    pub fn has_valid_move(&self, top_card: &Card) -> bool {
        self.hand.iter().any(|card| card.matches(top_card))
    }

    pub fn legal_cards(&self, top_card: &Card) -> Vec<Card> {
        self.hand
            .iter()
            .filter(|card| card.matches(top_card))
            .copied()
            .collect()
    }

    pub fn has_won(&self) -> bool {
        self.hand.is_empty()
    }

    pub fn choose_move<R: Rng + ?Sized>(
        &self,
        top_card: &Card,
        rng: &mut R,
        presenter: &mut dyn Presenter,
    ) -> Decision {
        let legal = self.legal_cards(top_card);
        if legal.is_empty() {
            return Decision::Decline;
        }
        match self.strategy {
            Strategy::Human => presenter.choose_card(self, top_card, &legal),
            Strategy::RuleBased => rule_based_move(&legal, rng),
        }
    }

    /// Picks the color a played wild card is bound to. A human who declines
    /// gets a random color, same as the rule-based player.
    pub fn choose_color<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        presenter: &mut dyn Presenter,
    ) -> Color {
        let chosen = match self.strategy {
            Strategy::Human => presenter.choose_color(self),
            Strategy::RuleBased => None,
        };
        match chosen {
            Some(color) if color != Color::Wild => color,
            _ => random_color(rng),
        }
    }
}

pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Color {
    Color::BASE[rng.random_range(0..Color::BASE.len())]
}

/// Action cards first, then any other colored card, wild cards last.
fn rule_based_move<R: Rng + ?Sized>(legal: &[Card], rng: &mut R) -> Decision {
    let actions: Vec<Card> = legal
        .iter()
        .filter(|card| matches!(card.face, Face::Skip | Face::Reverse | Face::DrawTwo))
        .copied()
        .collect();
    let colored: Vec<Card> = legal.iter().filter(|card| !card.is_wild_family()).copied().collect();

    let pool = if !actions.is_empty() {
        &actions[..]
    } else if !colored.is_empty() {
        &colored[..]
    } else {
        legal
    };

    match pool.choose(rng) {
        Some(card) => Decision::Play(*card),
        None => Decision::Decline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    struct NoPresenter;

    impl Presenter for NoPresenter {
        fn choose_card(&mut self, _player: &Player, _top_card: &Card, _legal: &[Card]) -> Decision {
            panic!("rule-based players never prompt");
        }

        fn choose_color(&mut self, _player: &Player) -> Option<Color> {
            panic!("rule-based players never prompt");
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_has_valid_move() {
        let mut player = Player::rule_based("Alice");
        player.hand = vec![
            Card::new(Color::Red, Face::Number(5)),
            Card::new(Color::Blue, Face::Skip),
        ];

        assert!(player.has_valid_move(&Card::new(Color::Green, Face::Number(5))));
        assert!(!player.has_valid_move(&Card::new(Color::Yellow, Face::Number(2))));

        player.hand.push(Card::new(Color::Wild, Face::Wild));
        assert!(player.has_valid_move(&Card::new(Color::Yellow, Face::Number(2))));
    }

    #[test]
    fn test_play_removes_one_copy() {
        let mut player = Player::human("Bob");
        let card = Card::new(Color::Red, Face::Number(3));
        player.hand = vec![card, card];

        assert_eq!(player.play(&card).unwrap(), card);
        assert_eq!(player.hand, vec![card]);
    }

    #[test]
    fn test_play_missing_card_leaves_hand_untouched() {
        let mut player = Player::human("Bob");
        player.hand = vec![Card::new(Color::Red, Face::Number(3))];

        let result = player.play(&Card::new(Color::Blue, Face::Number(3)));
        assert!(matches!(result, Err(GameError::CardNotInHand)));
        assert_eq!(player.hand.len(), 1);
    }

    #[test]
    fn test_draw_stops_when_deck_empty() {
        let mut player = Player::rule_based("Alice");
        let mut deck = Deck::from_cards(vec![Card::new(Color::Red, Face::Number(1))]);

        let drawn = player.draw(&mut deck, 4);
        assert_eq!(drawn.len(), 1);
        assert_eq!(player.hand.len(), 1);
        assert!(deck.is_empty());
    }

    #[test]
    fn test_rule_based_prefers_action_cards() {
        let mut player = Player::rule_based("AI");
        player.hand = vec![
            Card::new(Color::Red, Face::Number(4)),
            Card::new(Color::Wild, Face::Wild),
            Card::new(Color::Red, Face::DrawTwo),
        ];
        let top = Card::new(Color::Red, Face::Number(9));

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let decision = player.choose_move(&top, &mut rng, &mut NoPresenter);
            assert_eq!(decision, Decision::Play(Card::new(Color::Red, Face::DrawTwo)));
        }
    }

    #[test]
    fn test_rule_based_keeps_wilds_for_last() {
        let mut player = Player::rule_based("AI");
        player.hand = vec![
            Card::new(Color::Wild, Face::WildDrawFour),
            Card::new(Color::Blue, Face::Number(9)),
        ];
        let top = Card::new(Color::Red, Face::Number(9));
        assert_eq!(
            player.choose_move(&top, &mut rng(), &mut NoPresenter),
            Decision::Play(Card::new(Color::Blue, Face::Number(9)))
        );

        player.hand.remove(1);
        assert_eq!(
            player.choose_move(&top, &mut rng(), &mut NoPresenter),
            Decision::Play(Card::new(Color::Wild, Face::WildDrawFour))
        );
    }

    #[test]
    fn test_rule_based_declines_without_legal_card() {
        let mut player = Player::rule_based("AI");
        player.hand = vec![Card::new(Color::Blue, Face::Number(1))];
        let top = Card::new(Color::Red, Face::Number(9));

        assert_eq!(player.choose_move(&top, &mut rng(), &mut NoPresenter), Decision::Decline);
    }

    #[test]
    fn test_rule_based_color_is_a_base_color() {
        let player = Player::rule_based("AI");
        let mut rng = rng();
        for _ in 0..50 {
            assert_ne!(player.choose_color(&mut rng, &mut NoPresenter), Color::Wild);
        }
    }

    /// Every card the rule-based player picks from `hand` over many seeds.
    fn picks(hand: Vec<Card>, top: Card) -> HashSet<Card> {
        let mut player = Player::rule_based("AI");
        player.hand = hand;
        (0..200)
            .filter_map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                match player.choose_move(&top, &mut rng, &mut NoPresenter) {
                    Decision::Play(card) => Some(card),
                    Decision::Decline => None,
                }
            })
            .collect()
    }

    #[test]
    fn test_rule_based_picks_among_action_cards() {
        let skip = Card::new(Color::Red, Face::Skip);
        let reverse = Card::new(Color::Red, Face::Reverse);
        let hand = vec![skip, Card::new(Color::Red, Face::Number(2)), reverse];

        let picked = picks(hand, Card::new(Color::Red, Face::Number(9)));
        assert_eq!(picked, HashSet::from([skip, reverse]));
    }

    #[test]
    fn test_rule_based_picks_among_colored_cards() {
        let red = Card::new(Color::Red, Face::Number(4));
        let blue = Card::new(Color::Blue, Face::Number(9));
        let hand = vec![Card::new(Color::Wild, Face::Wild), red, blue];

        let picked = picks(hand, Card::new(Color::Red, Face::Number(9)));
        assert_eq!(picked, HashSet::from([red, blue]));
    }

    #[test]
    fn test_rule_based_picks_among_wild_cards() {
        let wild = Card::new(Color::Wild, Face::Wild);
        let draw_four = Card::new(Color::Wild, Face::WildDrawFour);
        let hand = vec![wild, Card::new(Color::Green, Face::Number(1)), draw_four];

        let picked = picks(hand, Card::new(Color::Red, Face::Number(9)));
        assert_eq!(picked, HashSet::from([wild, draw_four]));
    }

    #[test]
    fn test_rule_based_color_reaches_every_base_color() {
        let player = Player::rule_based("AI");
        let mut rng = rng();
        let colors: HashSet<Color> = (0..200)
            .map(|_| player.choose_color(&mut rng, &mut NoPresenter))
            .collect();

        assert_eq!(colors, HashSet::from(Color::BASE));
    }
}
