use crate::config::Config;
use log::info;
use mongodb::Client;

pub async fn connect_to_database(config: &Config) -> mongodb::error::Result<Client> {
    let client = Client::with_uri_str(&config.mongo_uri).await?;
    info!("Connected to MongoDB, using database {}", config.db_name);
    Ok(client)
}
