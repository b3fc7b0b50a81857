use crate::model::Transaction;

/// Returns the transactions whose category, description or plain amount (e.g. `30000`) contains
/// `query`, ignoring case. A blank query returns everything, in order.
pub fn filter<'a>(cached: &'a [Transaction], query: &str) -> Vec<&'a Transaction> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return cached.iter().collect();
    }
    cached
        .iter()
        .filter(|t| {
            t.category().to_lowercase().contains(&query)
                || t.description().to_lowercase().contains(&query)
                || t.amount().plain().contains(&query)
        })
        .collect()
}

/// Holds the last transaction list that was loaded so that searches never trigger another load.
#[derive(Debug, Default, Clone)]
pub struct SearchCache {
    snapshot: Vec<Transaction>,
}

impl SearchCache {
    pub fn new(snapshot: Vec<Transaction>) -> Self {
        Self { snapshot }
    }

    /// Replaces the cached list with a newer one.
    pub fn update(&mut self, snapshot: Vec<Transaction>) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &[Transaction] {
        &self.snapshot
    }

    pub fn search(&self, query: &str) -> Vec<&Transaction> {
        filter(&self.snapshot, query)
    }
}
