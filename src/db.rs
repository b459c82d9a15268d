use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use crate::models::Holding;

const DB_NAME: &str = "stockfolio";
const COLLECTION: &str = "stocks";

/// Handle to the holdings collection.
///
/// Valuation only ever reads through [`HoldingsStore::list_all`]; writes
/// happen from the CRUD handlers and the price mirroring path.
#[derive(Clone)]
pub struct HoldingsStore {
    stocks: Collection<Holding>,
}

impl HoldingsStore {
    /// Connect to MongoDB and bind the stocks collection. Uses the database
    /// from the connection string when one is given.
    pub async fn connect(uri: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DB_NAME));
        Ok(Self {
            stocks: database.collection(COLLECTION),
        })
    }

    pub async fn list_all(&self) -> Result<Vec<Holding>, mongodb::error::Error> {
        let cursor = self.stocks.find(doc! {}).await?;
        cursor.try_collect().await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Holding>, mongodb::error::Error> {
        self.stocks.find_one(doc! { "_id": id }).await
    }

    pub async fn insert(&self, holding: &Holding) -> Result<(), mongodb::error::Error> {
        self.stocks.insert_one(holding).await?;
        Ok(())
    }

    pub async fn replace(&self, holding: &Holding) -> Result<(), mongodb::error::Error> {
        self.stocks
            .replace_one(doc! { "_id": &holding.id }, holding)
            .await?;
        Ok(())
    }

    /// Returns false when no document matched the id.
    pub async fn delete(&self, id: &str) -> Result<bool, mongodb::error::Error> {
        let result = self.stocks.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Mirror the latest quoted price into a holding document.
    pub async fn update_price(
        &self,
        id: &str,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<(), mongodb::error::Error> {
        self.stocks
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "currentPrice": price,
                    "lastUpdated": mongodb::bson::DateTime::from_chrono(at),
                }},
            )
            .await?;
        Ok(())
    }
}
