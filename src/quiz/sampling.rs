// src/quiz/sampling.rs

use rand::{Rng, seq::SliceRandom};

/// How many questions one attempt serves.
/// A non-positive `quiz_count` means the whole bank.
pub fn served_count(quiz_count: i64, bank_size: usize) -> usize {
    if quiz_count <= 0 {
        return bank_size;
    }
    usize::try_from(quiz_count).map_or(bank_size, |count| count.min(bank_size))
}

/// Shuffles the bank and keeps the first [`served_count`] questions.
pub fn sample_questions<T, R: Rng + ?Sized>(mut bank: Vec<T>, quiz_count: i64, rng: &mut R) -> Vec<T> {
    let count = served_count(quiz_count, bank.len());
    bank.shuffle(rng);
    bank.truncate(count);
    bank
}
