use crate::args::CategoryAddArgs;
use crate::commands::{open_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Categories, Category, CategoryGroup};
use crate::store::Store;
use crate::{Config, Result};
use std::fmt::Write;

/// Adds a category. Names are unique per type ignoring case, and only top-level categories can
/// have children.
pub async fn category_add(config: Config, args: CategoryAddArgs) -> Result<Out<Category>> {
    let store = open_store(&config).await?;
    let mut category = Category::new(args.name().trim(), args.kind());
    if let Some(parent) = args.parent() {
        category = category.with_parent(parent);
    }
    let saved = store
        .add_category(category)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(Out::new(
        format!(
            "Added {} category '{}' ({})",
            saved.kind(),
            saved.name(),
            saved.id()
        ),
        saved,
    ))
}

/// Lists the categories grouped under their top-level parents.
pub async fn category_list(config: Config) -> Result<Out<Vec<CategoryGroup>>> {
    let store = open_store(&config).await?;
    let categories = store.categories().await.pub_result(ErrorType::Store)?;
    let groups = Categories::new(categories).grouped();
    if groups.is_empty() {
        return Ok(Out::new("There are no categories yet", groups));
    }

    let mut message = String::from("Categories:");
    for group in &groups {
        let parent = &group.parent;
        let _ = write!(
            message,
            "\n  {} [{}] ({})",
            parent.name(),
            parent.kind(),
            parent.id()
        );
        for child in &group.children {
            let _ = write!(message, "\n    {} ({})", child.name(), child.id());
        }
    }
    Ok(Out::new(message, groups))
}
