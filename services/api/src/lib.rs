mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use heartbeats::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
