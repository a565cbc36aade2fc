mod helpers;
mod mocks;

mod accounts;
mod challenges;
mod decks;
mod payments;
