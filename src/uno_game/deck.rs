use super::card::{Card, Color, Face};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const STANDARD_DECK_SIZE: usize = 108;

/// Draw pile. The top of the deck is the end of `cards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A complete 108 card deck, shuffled with `rng`.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle(rng);
        deck
    }

    /// The full composition in a fixed order.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(STANDARD_DECK_SIZE);

        for color in Color::BASE {
            cards.push(Card::new(color, Face::Number(0)));

            for _ in 0..2 {
                for number in 1..=9 {
                    cards.push(Card::new(color, Face::Number(number)));
                }
                cards.push(Card::new(color, Face::Skip));
                cards.push(Card::new(color, Face::Reverse));
                cards.push(Card::new(color, Face::DrawTwo));
            }
        }

        for _ in 0..4 {
            cards.push(Card::new(Color::Wild, Face::Wild));
            cards.push(Card::new(Color::Wild, Face::WildDrawFour));
        }

        Self { cards }
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes the top card, or `None` once the deck is exhausted.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Re-buries a card under the rest of the deck.
    pub fn insert_at_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    /// Adds cards and reshuffles the whole deck.
    pub fn refill<R: Rng + ?Sized>(&mut self, cards: impl IntoIterator<Item = Card>, rng: &mut R) {
        self.cards.extend(cards);
        self.shuffle(rng);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
