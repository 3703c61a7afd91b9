use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{GameError, ParticipantName};

/// Attempts a single draw gets before it gives up with `DrawExhausted`.
pub const MAX_DRAW_ATTEMPTS: usize = 100;

/// Giver -> receiver assignments produced by a successful draw.
///
/// Only single-row lookups are public.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    pairs: HashMap<ParticipantName, ParticipantName>,
}

impl Pairing {
    pub fn receiver_for(&self, giver: &str) -> Option<&str> {
        self.pairs.get(giver).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Drops every row where `name` gives or receives. Other rows stay as drawn.
    pub(crate) fn drop_participant(&mut self, name: &str) {
        self.pairs
            .retain(|giver, receiver| giver.as_str() != name && receiver.as_str() != name);
    }

    #[cfg(test)]
    pub(crate) fn rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(g, r)| (g.as_str(), r.as_str()))
    }
}

/// Draws a derangement of `roster` by rejection sampling.
///
/// Each attempt walks the givers in shuffled order and hands each one a
/// random receiver from the shrinking pool, never itself. An attempt that
/// leaves the last giver with only itself is thrown away whole.
pub fn draw_pairing<R: Rng + ?Sized>(
    roster: &[ParticipantName],
    rng: &mut R,
    max_attempts: usize,
) -> Result<Pairing, GameError> {
    if roster.len() < 2 {
        return Err(GameError::InsufficientParticipants);
    }

    let mut givers = roster.to_vec();
    for attempt in 1..=max_attempts {
        givers.shuffle(rng);
        if let Some(pairs) = try_assign(&givers, roster, rng) {
            log::debug!("[DRAW] settled on attempt {attempt} for {} participants", roster.len());
            return Ok(Pairing { pairs });
        }
        log::debug!("[DRAW] attempt {attempt} dead-ended, retrying");
    }

    Err(GameError::DrawExhausted {
        attempts: max_attempts,
    })
}

fn try_assign<R: Rng + ?Sized>(
    givers: &[ParticipantName],
    roster: &[ParticipantName],
    rng: &mut R,
) -> Option<HashMap<ParticipantName, ParticipantName>> {
    let mut pool: Vec<&ParticipantName> = roster.iter().collect();
    let mut pairs = HashMap::with_capacity(givers.len());

    for giver in givers {
        let eligible: Vec<usize> = (0..pool.len()).filter(|&i| pool[i] != giver).collect();
        let &pick = eligible.choose(rng)?;
        let receiver = pool.swap_remove(pick);
        pairs.insert(giver.clone(), receiver.clone());
    }

    Some(pairs)
}
