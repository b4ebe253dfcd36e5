use crate::{DrawLimits, DrawnCard, Post, RandomSource};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("post pool is empty")]
    EmptyPool,
}

/// Select up to `dice_roll` distinct posts with images from `pool`.
///
/// Each slot draws a value `R` in `1..=M`, preferring values unused in this
/// batch, and maps the lucky number `T = R + dice_roll` to pool index
/// `(T - 1) % M`. A candidate without an image or already in the batch costs
/// one attempt; a slot gives up after `max_card_attempts`, and the whole batch
/// stops trying after `max_batch_attempts`. Abandoned slots make the batch
/// shorter, they are not errors. Cards come back in slot order.
pub fn draw_cards<R: RandomSource + ?Sized>(
    dice_roll: u8,
    pool: &[Post],
    rng: &mut R,
    limits: &DrawLimits,
) -> Result<Vec<DrawnCard>, DrawError> {
    let pool_len = pool.len();
    if pool_len == 0 {
        return Err(DrawError::EmptyPool);
    }
    let requested = usize::from(dice_roll);
    let mut selected: Vec<DrawnCard> = Vec::with_capacity(requested);
    let mut used_values: HashSet<usize> = HashSet::with_capacity(requested);
    let mut batch_attempts = 0u32;

    for slot in 0..requested {
        let mut found = false;
        let mut slot_attempts = 0u32;
        while !found
            && slot_attempts < limits.max_card_attempts
            && batch_attempts < limits.max_batch_attempts
        {
            slot_attempts += 1;
            batch_attempts += 1;

            let random_value = next_random_value(
                rng,
                pool_len,
                &used_values,
                limits.max_unique_value_attempts,
                slot,
            );
            used_values.insert(random_value);

            let lucky_number = random_value + requested;
            let index = (lucky_number - 1) % pool_len;
            let candidate = &pool[index];
            let duplicate = selected.iter().any(|card| card.post.id == candidate.id);

            if candidate.has_image() && !duplicate {
                selected.push(DrawnCard {
                    post: candidate.clone(),
                    dice_roll,
                    random_value,
                    lucky_number,
                });
                found = true;
            } else {
                debug!(
                    slot = slot + 1,
                    index,
                    attempt = slot_attempts,
                    max = limits.max_card_attempts,
                    "candidate has no image or is already drawn; retrying"
                );
            }
        }
        if !found {
            warn!(
                slot = slot + 1,
                requested, "no eligible post found for slot; batch will be short"
            );
        }
    }
    Ok(selected)
}

fn next_random_value<R: RandomSource + ?Sized>(
    rng: &mut R,
    pool_len: usize,
    used_values: &HashSet<usize>,
    max_attempts: u32,
    slot: usize,
) -> usize {
    let mut attempts = 0u32;
    loop {
        let value = rng.range_inclusive(1, pool_len);
        attempts += 1;
        // Once every value has been used a duplicate is the only option.
        if !used_values.contains(&value) || used_values.len() >= pool_len {
            return value;
        }
        if attempts >= max_attempts {
            warn!(
                slot = slot + 1,
                value, "no unused random value found; accepting a duplicate"
            );
            return value;
        }
    }
}
