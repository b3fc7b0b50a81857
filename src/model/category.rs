use crate::error::Res;
use crate::model::TransactionKind;
use crate::utils::same_name;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named bucket for transactions. Categories nest at most one level deep: a category either has
/// no parent or its parent has no parent.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, kind: TransactionKind) -> Self {
        Self {
            id: format!("cat-{}", Uuid::new_v4().simple()),
            user_id: String::new(),
            name: name.into(),
            kind,
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A top-level category together with its direct children.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub parent: Category,
    pub children: Vec<Category>,
}

/// The caller's category table.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Categories {
    data: Vec<Category>,
}

impl Categories {
    pub fn new(data: Vec<Category>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Vec<Category> {
        &self.data
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.data.iter().find(|c| c.id == id)
    }

    /// Checks that `category` can be added and then adds it.
    ///
    /// # Errors
    /// - The name is blank.
    /// - Another category of the same user and type already has the same name (case-insensitive).
    /// - The parent does not exist, or the parent is itself a child.
    pub fn add(&mut self, category: Category) -> Res<()> {
        if category.name.trim().is_empty() {
            bail!("A category name cannot be blank");
        }
        let duplicate = self.data.iter().any(|c| {
            c.user_id == category.user_id
                && c.kind == category.kind
                && same_name(&c.name, &category.name)
        });
        if duplicate {
            bail!(
                "A {} category named '{}' already exists",
                category.kind,
                category.name
            );
        }
        if let Some(parent_id) = category.parent_id.as_deref() {
            let parent = self
                .get(parent_id)
                .with_context(|| format!("Parent category '{parent_id}' does not exist"))?;
            if !parent.is_top_level() {
                bail!(
                    "Category '{}' is already a subcategory and cannot have children",
                    parent.name
                );
            }
        }
        self.data.push(category);
        Ok(())
    }

    /// Groups the table into top-level categories and their direct children, in table order.
    pub fn grouped(&self) -> Vec<CategoryGroup> {
        self.data
            .iter()
            .filter(|c| c.is_top_level())
            .map(|parent| CategoryGroup {
                parent: parent.clone(),
                children: self
                    .data
                    .iter()
                    .filter(|c| c.parent_id.as_deref() == Some(parent.id.as_str()))
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

impl From<Vec<Category>> for Categories {
    fn from(data: Vec<Category>) -> Self {
        Self::new(data)
    }
}
