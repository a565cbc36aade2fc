//! # Quiz server
//! This crate hosts the HTTP server for the quiz arena. It is responsible for:
//! * Selling coins: creating PIX payments with the payment provider and crediting players when the provider's webhook
//!   reports the payment as approved.
//! * Selling and serving quiz decks, including the free daily deck.
//! * Challenges and their leaderboards, and storing the results of finished matches.
//!
//! The game rules themselves live in [`quiz_engine`]. This crate only exposes them over HTTP.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/payment/create`: Start a coin purchase.
//! * `POST /api/payment/webhook`: Payment notifications from the provider. Signed with the webhook secret.
//! * `GET /api/balance/{user_id}`: A player's coin balance.
//! * `POST /api/generate-deck`: Buy a newly generated deck.
//! * `GET /api/daily-deck`: Today's shared deck.
//! * `GET /api/decks/{deck_id}`: A deck.
//! * `POST /api/challenge/create`, `POST /api/challenge/join`, `GET /api/challenge/{challenge_id}`: Challenges.
//! * `POST /api/matches`: Record a finished match.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
