use crate::args::SearchArgs;
use crate::commands::{open_store, Out};
use crate::live::LiveSequence;
use crate::model::Transaction;
use crate::search::SearchCache;
use crate::store::Store;
use crate::{Config, Result};
use std::fmt::Write;

/// Lists the transactions whose category, description or amount contains the query.
pub async fn search(config: Config, args: SearchArgs) -> Result<Out<Vec<Transaction>>> {
    let store = open_store(&config).await?;
    let cache = SearchCache::new(store.transactions().next().await.unwrap_or_default());
    let query = args.query();
    let found: Vec<Transaction> = cache.search(&query).into_iter().cloned().collect();

    if found.is_empty() {
        return Ok(Out::new(
            format!("No transactions match '{}'", query.trim()),
            found,
        ));
    }
    let mut message = format!("Found {} transaction(s):", found.len());
    for t in &found {
        let _ = write!(
            message,
            "\n  {} {} {} '{}' {} ({})",
            t.date().format("%Y-%m-%d"),
            t.kind(),
            t.amount(),
            t.category(),
            t.description(),
            t.id()
        );
    }
    Ok(Out::new(message, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use chrono::Utc;

    #[tokio::test]
    async fn test_search_matches_and_blank() {
        let env = TestEnv::new().await;
        env.add_expense("Food & Drinks", 30_000, Utc::now()).await;
        env.add_expense("Transportation", 50_000, Utc::now()).await;

        let out = search(env.config(), SearchArgs::new("food")).await.unwrap();
        let found = out.structure().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category(), "Food & Drinks");

        let out = search(env.config(), SearchArgs::new("50000")).await.unwrap();
        assert_eq!(out.structure().unwrap()[0].category(), "Transportation");

        let out = search(env.config(), SearchArgs::default()).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_no_match() {
        let env = TestEnv::new().await;
        let out = search(env.config(), SearchArgs::new("rent")).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
        assert_eq!(out.message(), "No transactions match 'rent'");
    }
}
