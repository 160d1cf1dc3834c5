use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
    Wild,
}

impl Color {
    /// The four colors a wild card can be bound to.
    pub const BASE: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Blue];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Face {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    pub face: Face,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCardError(pub String);

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse card from {:?}", self.0)
    }
}

impl std::error::Error for ParseCardError {}

impl Card {
    pub fn new(color: Color, face: Face) -> Self {
        Self { color, face }
    }

    pub fn is_wild_family(&self) -> bool {
        matches!(self.face, Face::Wild | Face::WildDrawFour)
    }

    /// A card is playable on `top` if it shares its color or face, or is a wild card.
    pub fn matches(&self, top: &Card) -> bool {
        self.color == Color::Wild || self.color == top.color || self.face == top.face
    }

    /// Same card with any chosen color cleared, as it sits in a deck or hand.
    pub fn unbound(self) -> Self {
        if self.is_wild_family() {
            Card::new(Color::Wild, self.face)
        } else {
            self
        }
    }

    /// `color:face` form used by persisted hands.
    pub fn to_record(&self) -> String {
        format!("{}:{}", self.color, self.face)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "Red",
            Color::Yellow => "Yellow",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Wild => "Wild",
        };
        f.write_str(name)
    }
}

impl FromStr for Color {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "wild" => Ok(Color::Wild),
            _ => Err(ParseCardError(s.to_string())),
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Number(n) => write!(f, "{}", n),
            Face::Skip => f.write_str("Skip"),
            Face::Reverse => f.write_str("Reverse"),
            Face::DrawTwo => f.write_str("DrawTwo"),
            Face::Wild => f.write_str("Wild"),
            Face::WildDrawFour => f.write_str("WildDrawFour"),
        }
    }
}

impl FromStr for Face {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Skip" => Ok(Face::Skip),
            "Reverse" => Ok(Face::Reverse),
            "DrawTwo" => Ok(Face::DrawTwo),
            "Wild" => Ok(Face::Wild),
            "WildDrawFour" => Ok(Face::WildDrawFour),
            digit => match digit.parse::<u8>() {
                Ok(n) if n <= 9 => Ok(Face::Number(n)),
                _ => Err(ParseCardError(s.to_string())),
            },
        }
    }
}

impl From<Face> for String {
    fn from(face: Face) -> Self {
        face.to_string()
    }
}

impl TryFrom<String> for Face {
    type Error = ParseCardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.color, self.face) {
            (Color::Wild, _) => write!(f, "{}", self.face),
            (color, face) if self.is_wild_family() => write!(f, "{} ({})", face, color),
            (color, face) => write!(f, "{} {}", color, face),
        }
    }
}

impl FromStr for Card {
    type Err = ParseCardError;

    /// Parses the `color:face` record form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (color, face) = s
            .split_once(':')
            .ok_or_else(|| ParseCardError(s.to_string()))?;
        Ok(Card::new(color.parse()?, face.parse()?))
    }
}
