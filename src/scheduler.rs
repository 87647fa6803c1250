use crate::config::Category;
use crate::db::Repository;
use crate::error::Result;

/// Durable round-robin rotation over the configured category list. The
/// position lives in the `scrape_state` singleton row, so the rotation
/// survives process restarts.
pub struct CategoryScheduler {
    categories: Vec<Category>,
}

impl CategoryScheduler {
    /// `categories` must be non-empty; config validation enforces this
    /// before a runner is built.
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The category to scrape next: one past the persisted pointer,
    /// wrapping around the list.
    pub async fn next(&self, repository: &Repository) -> Result<(usize, &Category)> {
        let pointer = repository.scrape_pointer().await?;
        let index = next_index(pointer, self.categories.len());
        Ok((index, &self.categories[index]))
    }

    /// Durably record that the pass for `index` completed. Called at most
    /// once per invocation, only after the pass's results (possibly zero)
    /// have been fully persisted.
    pub async fn advance(&self, repository: &Repository, index: usize) -> Result<()> {
        repository.set_scrape_pointer(index as i64).await
    }
}

/// Compute the next rotation index from the raw persisted pointer. A
/// missing pointer or one outside `[-1, N)` counts as -1, so corrupt state
/// restarts the rotation at the first category instead of failing the run.
pub fn next_index(pointer: Option<i64>, category_count: usize) -> usize {
    let count = category_count as i64;
    let last = match pointer {
        Some(value) if (-1..count).contains(&value) => value,
        _ => -1,
    };
    ((last + 1) % count) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn categories(n: usize) -> Vec<Category> {
        (0..n)
            .map(|i| Category {
                key: format!("cat{}", i),
                url: format!("https://example.com/Categories/cat{}", i),
            })
            .collect()
    }

    #[test]
    fn rotation_visits_every_category_then_wraps() {
        let mut pointer = None;
        let mut visited = Vec::new();
        for _ in 0..4 {
            let index = next_index(pointer, 3);
            visited.push(index);
            pointer = Some(index as i64);
        }
        assert_eq!(visited, vec![0, 1, 2, 0]);
    }

    #[test]
    fn corrupt_pointer_restarts_at_first_category() {
        assert_eq!(next_index(None, 5), 0);
        assert_eq!(next_index(Some(-7), 5), 0);
        assert_eq!(next_index(Some(5), 5), 0);
        assert_eq!(next_index(Some(99), 5), 0);
    }

    #[test]
    fn seed_pointer_starts_at_first_category() {
        assert_eq!(next_index(Some(-1), 3), 0);
    }

    #[tokio::test]
    async fn textual_pointer_restarts_at_first_category() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        repo.execute_batch(
            "UPDATE scrape_state SET last_scraped_category_index = 'garbage' WHERE id = 1;",
        )
        .await
        .unwrap();

        let scheduler = CategoryScheduler::new(categories(3));
        let (index, category) = scheduler.next(&repo).await.unwrap();
        assert_eq!(index, 0);
        assert_eq!(category.key, "cat0");
    }

    #[tokio::test]
    async fn durable_rotation_round_robin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        let scheduler = CategoryScheduler::new(categories(3));

        let mut keys = Vec::new();
        for _ in 0..3 {
            let (index, category) = scheduler.next(&repo).await.unwrap();
            keys.push(category.key.clone());
            scheduler.advance(&repo, index).await.unwrap();
        }
        assert_eq!(keys, vec!["cat0", "cat1", "cat2"]);

        let (index, category) = scheduler.next(&repo).await.unwrap();
        assert_eq!(index, 0);
        assert_eq!(category.key, "cat0");
    }
}
