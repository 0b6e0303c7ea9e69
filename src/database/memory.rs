use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Database, ProductStore, StoreError};
use crate::models::product::{NewProduct, Product};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i32, Product>,
    // Last id handed out. Ids reserved by discarded sessions are not reused.
    last_id: i32,
}

/// Process-local `products` table, used with `DATABASE_URL=memory` and in tests.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    table: Arc<RwLock<Table>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn session(&self) -> Result<Box<dyn ProductStore>, StoreError> {
        Ok(Box::new(MemoryProductStore {
            table: Arc::clone(&self.table),
            pending: Vec::new(),
        }))
    }
}

#[derive(Debug)]
enum Change {
    Insert(Product),
    Update(Product),
    Delete(i32),
}

impl Change {
    fn apply(&self, rows: &mut BTreeMap<i32, Product>) -> Result<(), StoreError> {
        match self {
            Change::Insert(product) => {
                rows.insert(product.id, product.clone());
            }
            Change::Update(product) => {
                let row = rows
                    .get_mut(&product.id)
                    .ok_or(StoreError::RowMissing(product.id))?;
                row.name = product.name.clone();
                row.price = product.price;
                row.qty = product.qty;
            }
            Change::Delete(id) => {
                rows.remove(id).ok_or(StoreError::RowMissing(*id))?;
            }
        }
        Ok(())
    }
}

/// Stages changes locally; nothing reaches the shared table before `save`.
pub struct MemoryProductStore {
    table: Arc<RwLock<Table>>,
    pending: Vec<Change>,
}

impl MemoryProductStore {
    // Committed rows with this session's own pending changes laid over them.
    async fn view(&self) -> BTreeMap<i32, Product> {
        let mut rows = self.table.read().await.rows.clone();
        for change in &self.pending {
            // A row removed by another session just drops out of the view.
            let _ = change.apply(&mut rows);
        }
        rows
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&mut self) -> Result<Vec<Product>, StoreError> {
        Ok(self.view().await.into_values().collect())
    }

    async fn find(&mut self, id: i32) -> Result<Option<Product>, StoreError> {
        Ok(self.view().await.remove(&id))
    }

    async fn add(&mut self, product: NewProduct) -> Result<Product, StoreError> {
        let id = {
            let mut table = self.table.write().await;
            table.last_id = table.last_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
            table.last_id
        };
        let product = product.with_id(id);
        self.pending.push(Change::Insert(product.clone()));
        Ok(product)
    }

    async fn update(&mut self, product: &Product) -> Result<(), StoreError> {
        self.pending.push(Change::Update(product.clone()));
        Ok(())
    }

    async fn remove(&mut self, product: &Product) -> Result<(), StoreError> {
        self.pending.push(Change::Delete(product.id));
        Ok(())
    }

    async fn save(self: Box<Self>) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        // All or nothing: changes land on a copy that replaces the table only
        // when every one of them applied.
        let mut rows = table.rows.clone();
        for change in &self.pending {
            change.apply(&mut rows)?;
        }
        table.rows = rows;
        debug!(changes = self.pending.len(), "Memory session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> NewProduct {
        NewProduct { name: "Pen".into(), price: 1.5, qty: 10 }
    }

    #[tokio::test]
    async fn saved_insert_is_visible_to_new_sessions() {
        let db = MemoryDatabase::new();

        let mut session = db.session().await.unwrap();
        let added = session.add(pen()).await.unwrap();
        session.save().await.unwrap();

        let mut session = db.session().await.unwrap();
        assert_eq!(session.find(added.id).await.unwrap(), Some(added.clone()));
        assert_eq!(session.list().await.unwrap(), vec![added]);
    }

    #[tokio::test]
    async fn dropped_session_discards_changes_but_not_ids() {
        let db = MemoryDatabase::new();

        let mut session = db.session().await.unwrap();
        let discarded = session.add(pen()).await.unwrap();
        // Own pending insert is readable before save.
        assert!(session.find(discarded.id).await.unwrap().is_some());
        drop(session);

        let mut session = db.session().await.unwrap();
        assert!(session.list().await.unwrap().is_empty());
        let kept = session.add(pen()).await.unwrap();
        session.save().await.unwrap();

        assert_ne!(kept.id, discarded.id);
        assert!(kept.id > discarded.id);
    }

    #[tokio::test]
    async fn update_and_remove_apply_on_save() {
        let db = MemoryDatabase::new();
        let mut session = db.session().await.unwrap();
        let mut product = session.add(pen()).await.unwrap();
        session.save().await.unwrap();

        let mut session = db.session().await.unwrap();
        product.name = "Pencil".into();
        product.price = 0.0;
        product.qty = 3;
        session.update(&product).await.unwrap();
        session.save().await.unwrap();

        let mut session = db.session().await.unwrap();
        assert_eq!(session.find(product.id).await.unwrap(), Some(product.clone()));
        session.remove(&product).await.unwrap();
        session.save().await.unwrap();

        let mut session = db.session().await.unwrap();
        assert_eq!(session.find(product.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn saving_changes_to_a_vanished_row_fails_and_applies_nothing() {
        let db = MemoryDatabase::new();
        let mut session = db.session().await.unwrap();
        let product = session.add(pen()).await.unwrap();
        session.save().await.unwrap();

        // Two requests load the same row; the first one deletes it.
        let mut deleter = db.session().await.unwrap();
        let mut updater = db.session().await.unwrap();
        let mut stale = updater.find(product.id).await.unwrap().unwrap();
        deleter.remove(&product).await.unwrap();
        deleter.save().await.unwrap();

        stale.qty = 99;
        updater.update(&stale).await.unwrap();
        let extra = updater.add(pen()).await.unwrap();
        let err = updater.save().await.unwrap_err();
        assert!(matches!(err, StoreError::RowMissing(id) if id == product.id));

        let mut session = db.session().await.unwrap();
        assert_eq!(session.find(extra.id).await.unwrap(), None);

        let err = {
            let mut session = db.session().await.unwrap();
            session.remove(&product).await.unwrap();
            session.save().await.unwrap_err()
        };
        assert_eq!(err.to_string(), format!("product {} no longer exists", product.id));
    }

    #[tokio::test]
    async fn add_fails_once_ids_run_out() {
        let db = MemoryDatabase::new();
        db.table.write().await.last_id = i32::MAX - 1;

        let mut session = db.session().await.unwrap();
        assert_eq!(session.add(pen()).await.unwrap().id, i32::MAX);
        let err = session.add(pen()).await.unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted));
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let db = MemoryDatabase::new();
        let mut session = db.session().await.unwrap();
        for name in ["c", "a", "b"] {
            session.add(NewProduct { name: name.into(), price: 1.0, qty: 1 }).await.unwrap();
        }
        session.save().await.unwrap();

        let mut session = db.session().await.unwrap();
        let ids: Vec<i32> = session.list().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
