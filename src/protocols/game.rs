//! Word-guess game protocol.
//!
//! The running state is indexed by the guesses and letters left. A correct
//! guess uses up a letter, a wrong one uses up a guess. Once no letters are
//! left the game must be declared won; once no guesses are left (with
//! letters remaining) it must be declared lost. Only then is the game back
//! in its terminal `NotRunning` state.
//!
//! Word choice, letter matching and any console interaction belong to the
//! caller: the protocol only sees the outcomes they produce.

use super::SetupError;
use crate::core::State;
use crate::kind::{ResourceKind, StateSpace};
use crate::registry::{Operation, Registry};
use serde::{Deserialize, Serialize};

pub const KIND: &str = "game";
pub const NEW_GAME: &str = "new_game";
pub const GUESS: &str = "guess";
pub const DECLARE_WON: &str = "declare_won";
pub const DECLARE_LOST: &str = "declare_lost";

/// State of a game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GameState {
    NotRunning,
    Running { guesses: u32, letters: u32 },
}

impl State for GameState {
    fn name(&self) -> &str {
        match self {
            GameState::NotRunning => "NotRunning",
            GameState::Running { .. } => "Running",
        }
    }
}

impl GameState {
    pub fn is_won(&self) -> bool {
        matches!(self, GameState::Running { letters: 0, .. })
    }

    pub fn is_lost(&self) -> bool {
        matches!(self, GameState::Running { guesses: 0, letters } if *letters > 0)
    }
}

/// What a game operation reports back.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum GameOutcome {
    /// A new word with this many distinct letters was chosen.
    Started { letters: u32 },
    /// Whether the guessed letter was in the word.
    Guessed(bool),
    Won,
    Lost,
}

/// Limits of a game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GameRules {
    /// Wrong guesses allowed per game.
    pub max_guesses: u32,
    /// Largest number of distinct letters a word may have.
    pub max_letters: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_guesses: 6,
            max_letters: 10,
        }
    }
}

impl GameRules {
    fn admits(&self, state: &GameState) -> bool {
        match state {
            GameState::NotRunning => true,
            GameState::Running { guesses, letters } => {
                *guesses <= self.max_guesses && *letters <= self.max_letters
            }
        }
    }
}

/// The `game` kind for the given rules.
pub fn kind(rules: GameRules) -> Result<ResourceKind<GameState, GameOutcome>, SetupError> {
    Ok(ResourceKind::builder(KIND)
        .initial(GameState::NotRunning)
        .terminal([GameState::NotRunning])
        .space(StateSpace::indexed(move |s| rules.admits(s)))
        .build()?)
}

fn operations(rules: GameRules) -> Result<Vec<Operation<GameState, GameOutcome>>, SetupError> {
    let max_guesses = rules.max_guesses;

    let new_game = Operation::builder(NEW_GAME)
        .when(|s| *s == GameState::NotRunning)
        .outcomes((1..=rules.max_letters).map(|letters| GameOutcome::Started { letters }))
        .next(move |_, outcome| match outcome {
            GameOutcome::Started { letters } => Some(GameState::Running {
                guesses: max_guesses,
                letters: *letters,
            }),
            _ => None,
        })
        .build()?;

    let guess = Operation::builder(GUESS)
        .when(|s| matches!(s, GameState::Running { guesses, letters } if *guesses > 0 && *letters > 0))
        .outcomes([GameOutcome::Guessed(true), GameOutcome::Guessed(false)])
        .next(|state, outcome| match (state, outcome) {
            (GameState::Running { guesses, letters }, GameOutcome::Guessed(true)) => {
                Some(GameState::Running {
                    guesses: *guesses,
                    letters: letters.checked_sub(1)?,
                })
            }
            (GameState::Running { guesses, letters }, GameOutcome::Guessed(false)) => {
                Some(GameState::Running {
                    guesses: guesses.checked_sub(1)?,
                    letters: *letters,
                })
            }
            _ => None,
        })
        .build()?;

    let declare_won = Operation::builder(DECLARE_WON)
        .when(GameState::is_won)
        .outcome(GameOutcome::Won)
        .moves_to(GameState::NotRunning)
        .build()?;

    let declare_lost = Operation::builder(DECLARE_LOST)
        .when(GameState::is_lost)
        .outcome(GameOutcome::Lost)
        .moves_to(GameState::NotRunning)
        .build()?;

    Ok(vec![new_game, guess, declare_won, declare_lost])
}

/// Declare the `game` kind and its operations on `registry`.
pub fn declare(
    registry: &mut Registry<GameState, GameOutcome>,
    rules: GameRules,
) -> Result<(), SetupError> {
    registry.declare_kind(kind(rules)?)?;
    for op in operations(rules)? {
        registry.register_operation(KIND, op)?;
    }
    Ok(())
}

/// A registry holding only the `game` kind.
pub fn registry(rules: GameRules) -> Result<Registry<GameState, GameOutcome>, SetupError> {
    let mut registry = Registry::new();
    declare(&mut registry, rules)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::ProtocolError;

    fn small() -> GameRules {
        GameRules {
            max_guesses: 2,
            max_letters: 3,
        }
    }

    #[test]
    fn reachable_states_cover_every_running_pair() {
        let registry = registry(small()).unwrap();
        let states = registry.reachable_states(KIND).unwrap();

        // NotRunning plus Running { g in 0..=2, l in 0..=3 }, except that
        // guesses and letters can never run out together.
        assert_eq!(states.len(), 1 + 3 * 4 - 1);
        assert!(states.contains(&GameState::Running {
            guesses: 0,
            letters: 3
        }));
        assert!(!states.contains(&GameState::Running {
            guesses: 0,
            letters: 0
        }));
    }

    #[test]
    fn start_uses_rules() {
        let registry = registry(small()).unwrap();
        let game = registry.instantiate(KIND).unwrap();

        game.perform(NEW_GAME, GameOutcome::Started { letters: 2 })
            .unwrap();
        assert_eq!(
            game.state(),
            GameState::Running {
                guesses: 2,
                letters: 2
            }
        );

        let other = registry.instantiate(KIND).unwrap();
        assert!(matches!(
            other.perform(NEW_GAME, GameOutcome::Started { letters: 4 }),
            Err(ProtocolError::UndeclaredOutcome { .. })
        ));
    }

    #[test]
    fn exhausted_guesses_force_declare_lost() {
        let registry = registry(small()).unwrap();
        let game = registry.instantiate(KIND).unwrap();
        game.perform(NEW_GAME, GameOutcome::Started { letters: 1 })
            .unwrap();
        game.perform(GUESS, GameOutcome::Guessed(false)).unwrap();
        game.perform(GUESS, GameOutcome::Guessed(false)).unwrap();

        assert!(game.state().is_lost());
        assert!(matches!(
            game.perform(GUESS, GameOutcome::Guessed(true)),
            Err(ProtocolError::PreconditionViolation { .. })
        ));
        assert!(matches!(
            game.perform(DECLARE_WON, GameOutcome::Won),
            Err(ProtocolError::PreconditionViolation { .. })
        ));

        game.perform(DECLARE_LOST, GameOutcome::Lost).unwrap();
        assert!(game.is_terminal());
    }

    #[test]
    fn won_and_lost_are_exclusive() {
        let won = GameState::Running {
            guesses: 0,
            letters: 0,
        };
        assert!(won.is_won());
        assert!(!won.is_lost());
        assert!(!GameState::NotRunning.is_won());
        assert!(!GameState::NotRunning.is_lost());
    }

    #[test]
    fn states_beyond_rules_are_outside_space() {
        let registry = registry(small()).unwrap();
        assert!(matches!(
            registry.instantiate_at(
                KIND,
                GameState::Running {
                    guesses: 5,
                    letters: 1
                }
            ),
            Err(ProtocolError::StateOutsideSpace { .. })
        ));
    }
}
