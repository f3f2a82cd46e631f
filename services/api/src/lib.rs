mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use bay_street::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
